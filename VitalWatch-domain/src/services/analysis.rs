//! Rule-based analysis of vital-sign readings.
//!
//! A reading is compared against fixed normal ranges and critical limits,
//! then against the user's own history: readings more than two standard
//! deviations from the historical mean are flagged as anomalies, and a
//! least-squares slope over the history gives the trend of each vital.

use crate::entities::{VitalSignsAnalysis, VitalSignsReading};

pub const STATUS_NORMAL: &str = "normal";
pub const STATUS_ALERT: &str = "alert";

/// Readings used as history when analysing a new one
pub const HISTORY_WINDOW: usize = 100;

/// History needed before anomalies are looked for
pub const MIN_ANOMALY_HISTORY: usize = 10;

const ANOMALY_STD_DEVS: f64 = 2.0;
const TREND_SLOPE_THRESHOLD: f64 = 0.1;

pub const ANOMALY_MESSAGE: &str = "Unusual vital signs pattern detected";

/// One measured quantity of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vital {
    HeartRate,
    Systolic,
    Diastolic,
    Temperature,
    OxygenSaturation,
}

impl Vital {
    pub const ALL: [Vital; 5] = [
        Vital::HeartRate,
        Vital::Systolic,
        Vital::Diastolic,
        Vital::Temperature,
        Vital::OxygenSaturation,
    ];

    /// Field name used in JSON payloads and forecasts
    pub fn key(&self) -> &'static str {
        match self {
            Vital::HeartRate => "heart_rate",
            Vital::Systolic => "blood_pressure_systolic",
            Vital::Diastolic => "blood_pressure_diastolic",
            Vital::Temperature => "temperature",
            Vital::OxygenSaturation => "oxygen_saturation",
        }
    }

    /// Name used in messages
    pub fn label(&self) -> &'static str {
        match self {
            Vital::HeartRate => "heart rate",
            Vital::Systolic => "blood pressure systolic",
            Vital::Diastolic => "blood pressure diastolic",
            Vital::Temperature => "temperature",
            Vital::OxygenSaturation => "oxygen saturation",
        }
    }

    /// Inclusive normal range
    pub fn normal_range(&self) -> (f64, f64) {
        match self {
            Vital::HeartRate => (60.0, 100.0),
            Vital::Systolic => (90.0, 140.0),
            Vital::Diastolic => (60.0, 90.0),
            Vital::Temperature => (36.1, 37.2),
            Vital::OxygenSaturation => (95.0, 100.0),
        }
    }

    pub fn value(&self, reading: &VitalSignsReading) -> f64 {
        match self {
            Vital::HeartRate => reading.heart_rate,
            Vital::Systolic => reading.blood_pressure_systolic,
            Vital::Diastolic => reading.blood_pressure_diastolic,
            Vital::Temperature => reading.temperature,
            Vital::OxygenSaturation => reading.oxygen_saturation,
        }
    }

    fn is_critical(&self, value: f64) -> bool {
        match self {
            Vital::HeartRate => !(40.0..=150.0).contains(&value),
            Vital::Systolic => !(70.0..=180.0).contains(&value),
            Vital::Diastolic => value > 120.0,
            Vital::Temperature => !(35.0..=40.0).contains(&value),
            Vital::OxygenSaturation => value < 90.0,
        }
    }

    pub fn series(&self, readings: &[VitalSignsReading]) -> Vec<f64> {
        readings.iter().map(|r| self.value(r)).collect()
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Least-squares line through `(index, value)`; returns `(slope, intercept)`
pub fn linear_regression(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    if values.len() < 2 {
        return (0.0, values.first().copied().unwrap_or(0.0));
    }

    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(values);
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    let slope = if denominator == 0.0 { 0.0 } else { numerator / denominator };
    (slope, y_mean - slope * x_mean)
}

/// Whether `value` lies more than two standard deviations from the mean
pub fn is_outlier(value: f64, mean: f64, std: f64) -> bool {
    std > 0.0 && (value - mean).abs() > ANOMALY_STD_DEVS * std
}

fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

/// Out-of-range messages for a single reading
pub fn range_alerts(reading: &VitalSignsReading) -> Vec<String> {
    let mut alerts = Vec::new();
    for vital in Vital::ALL {
        let value = vital.value(reading);
        let (low, high) = vital.normal_range();
        if value < low {
            alerts.push(format!("Low {}: {:.1}", vital.label(), value));
        } else if value > high {
            alerts.push(format!("High {}: {:.1}", vital.label(), value));
        }
    }
    alerts
}

pub fn critical_concerns(reading: &VitalSignsReading) -> Vec<String> {
    Vital::ALL
        .iter()
        .filter(|vital| vital.is_critical(vital.value(reading)))
        .map(|vital| format!("Critical {}: {:.1}", vital.label(), vital.value(reading)))
        .collect()
}

fn detect_anomaly(current: &VitalSignsReading, history: &[VitalSignsReading]) -> bool {
    if history.len() < MIN_ANOMALY_HISTORY {
        return false;
    }
    Vital::ALL.iter().any(|vital| {
        let values = vital.series(history);
        is_outlier(vital.value(current), mean(&values), std_dev(&values))
    })
}

fn trends(history: &[VitalSignsReading]) -> Vec<String> {
    let mut trends = Vec::new();
    if history.len() <= MIN_ANOMALY_HISTORY {
        return trends;
    }
    for vital in Vital::ALL {
        let (slope, _) = linear_regression(&vital.series(history));
        if slope > TREND_SLOPE_THRESHOLD {
            trends.push(format!("{} is increasing", vital.label()));
        } else if slope < -TREND_SLOPE_THRESHOLD {
            trends.push(format!("{} is decreasing", vital.label()));
        }
    }
    trends
}

fn predictions(history: &[VitalSignsReading]) -> Vec<String> {
    let mut predictions = Vec::new();
    if history.is_empty() {
        return predictions;
    }

    let systolic = Vital::Systolic.series(history);
    let diastolic = Vital::Diastolic.series(history);
    if mean(&systolic) > 130.0 || mean(&diastolic) > 80.0 {
        predictions.push("Potential hypertension detected".to_string());
    }

    let temperature = Vital::Temperature.series(history);
    if mean(tail(&temperature, 5)) > 37.2 {
        predictions.push("Elevated temperature pattern detected".to_string());
    }

    let spo2 = Vital::OxygenSaturation.series(history);
    if mean(tail(&spo2, 5)) < 95.0 {
        predictions.push("Declining oxygen saturation trend".to_string());
    }

    let heart_rate = Vital::HeartRate.series(history);
    if std_dev(tail(&heart_rate, 10)) > 15.0 {
        predictions.push("Irregular heart rate pattern detected".to_string());
    }

    predictions
}

/// Analyse the most recent reading of `history` (oldest first).
///
/// The reading being analysed is expected to be the last element; an empty
/// history yields a `normal` status with nothing flagged.
pub fn analyze_vital_signs(history: &[VitalSignsReading]) -> VitalSignsAnalysis {
    let Some(current) = history.last() else {
        return VitalSignsAnalysis {
            status: STATUS_NORMAL.to_string(),
            ..Default::default()
        };
    };

    let alerts = range_alerts(current);
    let critical_concerns = critical_concerns(current);
    let anomalies = if detect_anomaly(current, history) {
        vec![ANOMALY_MESSAGE.to_string()]
    } else {
        Vec::new()
    };

    let status = if alerts.is_empty() && anomalies.is_empty() {
        STATUS_NORMAL
    } else {
        STATUS_ALERT
    };

    VitalSignsAnalysis {
        status: status.to_string(),
        alerts,
        critical_concerns,
        anomalies,
        trends: trends(history),
        predictions: predictions(history),
    }
}
