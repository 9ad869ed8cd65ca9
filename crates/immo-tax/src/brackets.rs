//! Progressive Band Engine
//!
//! Cumulative application of an ordered list of rate bands. Used by the
//! inheritance/gift tax classes and by the notary fee schedule, so adding a
//! band or a class is a table change.

use immo_core::{TaxError, TaxResult};
use serde::{Deserialize, Serialize};

/// One band of a progressive schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBand {
    /// Upper boundary of the band (inclusive); `None` for the open-ended top band
    pub upper: Option<f64>,
    /// Rate applied to the slice of the amount inside this band
    pub rate_percent: f64,
}

impl TaxBand {
    pub fn up_to(upper: f64, rate_percent: f64) -> Self {
        Self {
            upper: Some(upper),
            rate_percent,
        }
    }

    pub fn open(rate_percent: f64) -> Self {
        Self {
            upper: None,
            rate_percent,
        }
    }
}

/// The part of an amount that fell into one band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSlice {
    pub lower: f64,
    pub upper: Option<f64>,
    pub rate_percent: f64,
    pub amount: f64,
    pub tax: f64,
}

/// Ordered bands, lowest first, the last one open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSchedule {
    pub bands: Vec<TaxBand>,
}

impl BandSchedule {
    pub fn new(bands: Vec<TaxBand>) -> TaxResult<Self> {
        let schedule = Self { bands };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Build a schedule from shared boundaries and one rate per band.
    ///
    /// `rates` must have exactly one more entry than `boundaries`; the extra
    /// rate applies above the last boundary.
    pub fn from_boundaries(boundaries: &[f64], rates: &[f64]) -> TaxResult<Self> {
        if rates.len() != boundaries.len() + 1 {
            return Err(TaxError::InvalidConfiguration(format!(
                "{} boundaries need {} rates, got {}",
                boundaries.len(),
                boundaries.len() + 1,
                rates.len()
            )));
        }
        let mut bands: Vec<TaxBand> = boundaries
            .iter()
            .zip(rates)
            .map(|(&upper, &rate)| TaxBand::up_to(upper, rate))
            .collect();
        bands.push(TaxBand::open(rates[rates.len() - 1]));
        Self::new(bands)
    }

    pub fn validate(&self) -> TaxResult<()> {
        let Some(last) = self.bands.last() else {
            return Err(TaxError::InvalidConfiguration(
                "band schedule has no bands".to_string(),
            ));
        };
        if last.upper.is_some() {
            return Err(TaxError::InvalidConfiguration(
                "last band must be open-ended".to_string(),
            ));
        }

        let mut previous = 0.0;
        for (i, band) in self.bands.iter().enumerate() {
            if !band.rate_percent.is_finite() || band.rate_percent < 0.0 {
                return Err(TaxError::InvalidConfiguration(format!(
                    "band {i} has invalid rate {}",
                    band.rate_percent
                )));
            }
            match band.upper {
                Some(upper) => {
                    if !upper.is_finite() || upper <= previous {
                        return Err(TaxError::InvalidConfiguration(format!(
                            "band {i} boundary {upper} must be above {previous}"
                        )));
                    }
                    previous = upper;
                }
                None if i + 1 < self.bands.len() => {
                    return Err(TaxError::InvalidConfiguration(format!(
                        "band {i} is open-ended but not last"
                    )));
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Tax on `amount` with every band applied cumulatively.
    pub fn apply(&self, amount: f64) -> f64 {
        self.breakdown(amount).iter().map(|s| s.tax).sum()
    }

    /// Per-band decomposition of `amount`. Bands the amount never reaches
    /// are omitted.
    pub fn breakdown(&self, amount: f64) -> Vec<BandSlice> {
        let mut slices = Vec::new();
        let mut remaining = amount.max(0.0);
        let mut lower = 0.0;

        for band in &self.bands {
            if remaining <= 0.0 {
                break;
            }
            let width = match band.upper {
                Some(upper) => upper - lower,
                None => f64::INFINITY,
            };
            let taxed = remaining.min(width);
            slices.push(BandSlice {
                lower,
                upper: band.upper,
                rate_percent: band.rate_percent,
                amount: taxed,
                tax: taxed * band.rate_percent / 100.0,
            });
            remaining -= taxed;
            if let Some(upper) = band.upper {
                lower = upper;
            }
        }

        slices
    }

    /// Marginal rate at `amount`.
    pub fn marginal_rate(&self, amount: f64) -> f64 {
        self.bands
            .iter()
            .find(|b| b.upper.map_or(true, |upper| amount <= upper))
            .map(|b| b.rate_percent)
            .unwrap_or(0.0)
    }
}
