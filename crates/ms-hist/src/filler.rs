//! Histogram filling from raw TDC columns.
//!
//! Raw values are digitizer ticks. A value `<= 0` means the channel did not
//! fire for that event and is excluded; every other value is converted to
//! nanoseconds before binning.

use std::collections::HashMap;

use ms_core::{Error, Result};

use crate::histogram::{BinSpec, Histogram};

/// Nanoseconds per TDC tick.
pub const NS_PER_TICK: f64 = 20.0;

/// Decay-electron detector channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingChannel {
    /// Upper detector (TDC6).
    Up,
    /// Lower detector (TDC7).
    Down,
}

impl TimingChannel {
    /// Default event-table column for this channel.
    pub fn column(self) -> &'static str {
        match self {
            TimingChannel::Up => "TDC6",
            TimingChannel::Down => "TDC7",
        }
    }

    /// Histogram name.
    pub fn hist_name(self) -> &'static str {
        match self {
            TimingChannel::Up => "up_hist",
            TimingChannel::Down => "down_hist",
        }
    }

    /// Histogram title.
    pub fn title(self) -> &'static str {
        match self {
            TimingChannel::Up => "TDC6 Histogram (Up events)",
            TimingChannel::Down => "TDC7 Histogram (Down events)",
        }
    }
}

/// Fill a histogram with `raw * ns_per_tick` for every strictly positive raw value.
pub fn fill_timing(
    name: &str,
    title: &str,
    raw: &[f64],
    ns_per_tick: f64,
    spec: BinSpec,
) -> Result<Histogram> {
    if !ns_per_tick.is_finite() || ns_per_tick <= 0.0 {
        return Err(Error::Validation(format!(
            "ns_per_tick must be finite and > 0, got {}",
            ns_per_tick
        )));
    }

    let mut h = Histogram::new(name, title, spec);
    let mut hits = 0usize;
    for &v in raw {
        if v > 0.0 {
            h.fill(v * ns_per_tick);
            hits += 1;
        }
    }
    tracing::debug!(
        name,
        events = raw.len(),
        hits,
        entries = h.entries,
        underflow = h.underflow,
        overflow = h.overflow,
        "filled timing histogram"
    );
    Ok(h)
}

/// Fill the up and down histograms from event columns.
///
/// `columns` maps column names to per-event raw values; both channel columns
/// must be present and have the same length.
pub fn fill_up_down(
    columns: &HashMap<String, Vec<f64>>,
    up_column: &str,
    down_column: &str,
    ns_per_tick: f64,
    spec: BinSpec,
) -> Result<(Histogram, Histogram)> {
    let get = |name: &str| {
        columns
            .get(name)
            .map(|v| v.as_slice())
            .ok_or_else(|| Error::MalformedInput(format!("missing column: '{}'", name)))
    };
    let up_raw = get(up_column)?;
    let down_raw = get(down_column)?;
    if up_raw.len() != down_raw.len() {
        return Err(Error::MalformedInput(format!(
            "channel columns differ in length ('{}'={}, '{}'={})",
            up_column,
            up_raw.len(),
            down_column,
            down_raw.len()
        )));
    }

    let up = fill_timing(
        TimingChannel::Up.hist_name(),
        TimingChannel::Up.title(),
        up_raw,
        ns_per_tick,
        spec,
    )?;
    let down = fill_timing(
        TimingChannel::Down.hist_name(),
        TimingChannel::Down.title(),
        down_raw,
        ns_per_tick,
        spec,
    )?;
    Ok((up, down))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> BinSpec {
        BinSpec::new(5, 0.0, 100.0).unwrap()
    }

    #[test]
    fn excludes_non_positive_and_scales() {
        // ticks: 0 and -1 are "no hit"; 1 tick = 20 ns -> bin 1; 4 ticks = 80 ns -> bin 4
        let h = fill_timing("h", "", &[0.0, -1.0, 1.0, 4.0, 0.5], NS_PER_TICK, spec()).unwrap();
        assert_eq!(h.bin_content, vec![1.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(h.entries, 3);
        assert_eq!(h.underflow, 0.0);
    }

    #[test]
    fn out_of_range_goes_to_overflow() {
        let h = fill_timing("h", "", &[5.0, 6.0, 2.0], NS_PER_TICK, spec()).unwrap();
        assert_eq!(h.overflow, 2.0);
        assert_eq!(h.entries, 1);
    }

    #[test]
    fn rejects_bad_scale() {
        assert!(fill_timing("h", "", &[1.0], 0.0, spec()).is_err());
        assert!(fill_timing("h", "", &[1.0], f64::NAN, spec()).is_err());
    }

    #[test]
    fn up_down_from_columns() {
        let mut cols = HashMap::new();
        cols.insert("TDC6".to_string(), vec![1.0, 0.0, 2.0]);
        cols.insert("TDC7".to_string(), vec![0.0, 3.0, 0.0]);
        let (up, down) = fill_up_down(&cols, "TDC6", "TDC7", NS_PER_TICK, spec()).unwrap();
        assert_eq!(up.name, "up_hist");
        assert_eq!(up.bin_content, vec![0.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(down.title, "TDC7 Histogram (Down events)");
        assert_eq!(down.bin_content, vec![0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_channel_column() {
        let mut cols = HashMap::new();
        cols.insert("TDC6".to_string(), vec![1.0]);
        let err = fill_up_down(&cols, "TDC6", "TDC7", NS_PER_TICK, spec()).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
        assert!(err.to_string().contains("TDC7"));
    }
}
