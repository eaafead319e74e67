//! Derived-column transforms over fetched batches.
//!
//! A [`ColumnTransform`] is a named, column-producing computation with a
//! declared set of required input columns. Applied to a [`CoeffBatch`], it
//! resolves its inputs against the batch's auxiliary columns by name and
//! produces one `f64` per batch row (e.g. a color index from two magnitude
//! columns, or a quality flag folded to a weight).
//!
//! The trait is object-safe so pipelines can carry a heterogeneous list of
//! `Box<dyn ColumnTransform>`; [`LambdaTransform`] covers the common case of
//! an ad-hoc closure without a dedicated type.

use crate::container::ColumnData;
use crate::lookup::CoeffBatch;
use crate::starshard_errors::StarshardError;

/// A named column-producing computation with declared inputs.
pub trait ColumnTransform {
    /// Name of the produced column.
    fn name(&self) -> &str;

    /// Auxiliary columns this transform reads, in argument order.
    fn required_columns(&self) -> &[String];

    /// Compute one output value per row from the resolved input columns.
    ///
    /// `inputs` arrives in [`required_columns`](ColumnTransform::required_columns)
    /// order; all columns have the batch's row count.
    fn apply(&self, inputs: &[&ColumnData]) -> Result<Vec<f64>, StarshardError>;
}

/// A [`ColumnTransform`] backed by a closure.
pub struct LambdaTransform<F>
where
    F: Fn(&[&ColumnData]) -> Vec<f64>,
{
    name: String,
    required_columns: Vec<String>,
    func: F,
}

impl<F> LambdaTransform<F>
where
    F: Fn(&[&ColumnData]) -> Vec<f64>,
{
    /// Wrap `func` as a transform producing `name` from `required_columns`.
    pub fn new(name: &str, required_columns: &[&str], func: F) -> Self {
        LambdaTransform {
            name: name.to_string(),
            required_columns: required_columns.iter().map(|c| c.to_string()).collect(),
            func,
        }
    }
}

impl<F> ColumnTransform for LambdaTransform<F>
where
    F: Fn(&[&ColumnData]) -> Vec<f64>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn required_columns(&self) -> &[String] {
        &self.required_columns
    }

    fn apply(&self, inputs: &[&ColumnData]) -> Result<Vec<f64>, StarshardError> {
        Ok((self.func)(inputs))
    }
}

impl CoeffBatch {
    /// Apply a transform to this batch's auxiliary columns.
    ///
    /// Each required column must have been requested via
    /// [`StreamOptions::extra_columns`](crate::lookup::StreamOptions::extra_columns)
    /// on the originating stream; a missing one surfaces as
    /// [`StarshardError::UnknownColumn`].
    pub fn derive(&self, transform: &dyn ColumnTransform) -> Result<Vec<f64>, StarshardError> {
        let inputs = transform
            .required_columns()
            .iter()
            .map(|name| {
                self.extras
                    .iter()
                    .find(|extra| &extra.name == name)
                    .map(|extra| &extra.values)
                    .ok_or_else(|| StarshardError::UnknownColumn {
                        column: name.clone(),
                        location: "batch auxiliary columns".to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        transform.apply(&inputs)
    }
}
