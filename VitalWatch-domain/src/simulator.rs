//! Simulated wearable readings for demos and the live dashboard.

use rand::Rng;

use crate::entities::RecordVitalSignsRequest;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// A reading inside the normal ranges
pub fn normal_reading<R: Rng + ?Sized>(rng: &mut R) -> RecordVitalSignsRequest {
    RecordVitalSignsRequest {
        heart_rate: round1(rng.gen_range(65.0..=95.0)),
        blood_pressure_systolic: rng.gen_range(95..=115) as f64,
        blood_pressure_diastolic: rng.gen_range(65..=75) as f64,
        temperature: round1(rng.gen_range(36.4..=36.9)),
        oxygen_saturation: round1(rng.gen_range(96.0..=100.0)),
        timestamp: None,
    }
}

/// A normal reading with one randomly chosen vital pushed out of range
pub fn abnormal_reading<R: Rng + ?Sized>(rng: &mut R) -> RecordVitalSignsRequest {
    let mut reading = normal_reading(rng);
    let high = rng.gen_bool(0.5);

    match rng.gen_range(0..4) {
        0 => {
            reading.heart_rate = if high {
                round1(rng.gen_range(105.0..=120.0))
            } else {
                round1(rng.gen_range(40.0..=55.0))
            };
        }
        1 => reading.oxygen_saturation = round1(rng.gen_range(85.0..=92.0)),
        2 => {
            reading.temperature = if high {
                round1(rng.gen_range(37.5..=38.3))
            } else {
                round1(rng.gen_range(35.0..=35.8))
            };
        }
        _ => {
            let (systolic, diastolic) = if high {
                (rng.gen_range(130..=140), rng.gen_range(85..=90))
            } else {
                (rng.gen_range(80..=85), rng.gen_range(50..=55))
            };
            reading.blood_pressure_systolic = systolic as f64;
            reading.blood_pressure_diastolic = diastolic as f64;
        }
    }

    reading
}

pub fn generate_reading<R: Rng + ?Sized>(rng: &mut R, abnormal: bool) -> RecordVitalSignsRequest {
    if abnormal {
        abnormal_reading(rng)
    } else {
        normal_reading(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::{range_alerts, Vital};
    use crate::services::vitals::request_to_reading;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use validator::Validate;

    #[test]
    fn test_normal_readings_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let request = normal_reading(&mut rng);
            assert!(request.validate().is_ok());
            let reading = request_to_reading(&request);
            assert!(range_alerts(&reading).is_empty(), "{:?}", reading);
            for vital in Vital::ALL {
                let value = vital.value(&reading);
                assert_eq!(value, round1(value));
            }
        }
    }

    #[test]
    fn test_abnormal_readings_leave_the_normal_band() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let request = abnormal_reading(&mut rng);
            assert!(request.validate().is_ok());
            assert!(request.blood_pressure_systolic > request.blood_pressure_diastolic);

            let outside = !(65.0..=95.0).contains(&request.heart_rate)
                || request.oxygen_saturation < 96.0
                || !(36.4..=36.9).contains(&request.temperature)
                || !(95.0..=115.0).contains(&request.blood_pressure_systolic);
            assert!(outside, "{:?}", request);

            // At most the blood pressure pair is pushed out together
            let alerts = range_alerts(&request_to_reading(&request));
            assert!(alerts.len() <= 2, "{:?}", alerts);
        }
    }
}
