//! Per-column standardization.

use landwatch_core::{Error, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};

#[derive(Debug, Clone)]
struct ScalerParams {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

/// Removes the column mean and divides by the column standard deviation.
///
/// The standard deviation is the population one (ddof = 0). Constant
/// columns get a scale of 1.0 so they map to zero instead of NaN.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    params: Option<ScalerParams>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learns the column means and scales from `x`
    pub fn fit(&mut self, x: ArrayView2<'_, f64>) -> Result<()> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(Error::Data(format!(
                "cannot fit scaler on a {}x{} matrix",
                x.nrows(),
                x.ncols()
            )));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::Data("cannot compute column means".to_string()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s.abs() < f64::EPSILON { 1.0 } else { s });

        self.params = Some(ScalerParams { mean, scale });
        Ok(())
    }

    /// Standardizes `x` with the fitted statistics
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let params = self.fitted()?;
        if x.ncols() != params.mean.len() {
            return Err(Error::InvalidArgument(format!(
                "expected {} columns, got {}",
                params.mean.len(),
                x.ncols()
            )));
        }

        Ok((&x - &params.mean) / &params.scale)
    }

    pub fn fit_transform(&mut self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Standardizes a single row
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        let params = self.fitted()?;
        if row.len() != params.mean.len() {
            return Err(Error::InvalidArgument(format!(
                "expected {} columns, got {}",
                params.mean.len(),
                row.len()
            )));
        }

        Ok(row
            .iter()
            .zip(params.mean.iter().zip(params.scale.iter()))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect())
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.params.as_ref().map(|p| &p.mean)
    }

    pub fn scale(&self) -> Option<&Array1<f64>> {
        self.params.as_ref().map(|p| &p.scale)
    }

    fn fitted(&self) -> Result<&ScalerParams> {
        self.params
            .as_ref()
            .ok_or_else(|| Error::Model("scaler has not been fitted".to_string()))
    }
}
