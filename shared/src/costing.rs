//! Per-distance running cost and emission figures for each propulsion type.
//!
//! Both tables are flat per-meter coefficients, so every derived figure is
//! linear in the route distance. Internal combustion carries the highest
//! coefficient in both tables, electric the lowest.

use crate::PropulsionType;

/// Operating cost in GBP per meter driven.
fn cost_per_meter(ptype: PropulsionType) -> f64 {
    match ptype {
        PropulsionType::Ic => 0.0016,
        PropulsionType::Ev => 0.0006,
        PropulsionType::Hydrogen => 0.0011,
    }
}

/// Well-to-wheel emissions in kg CO2e per meter driven.
fn emission_per_meter(ptype: PropulsionType) -> f64 {
    match ptype {
        PropulsionType::Ic => 0.00130,
        PropulsionType::Ev => 0.00045,
        PropulsionType::Hydrogen => 0.00095,
    }
}

pub fn cost(ptype: PropulsionType, distance_m: f64) -> f64 {
    cost_per_meter(ptype) * distance_m
}

pub fn emission(ptype: PropulsionType, distance_m: f64) -> f64 {
    emission_per_meter(ptype) * distance_m
}

/// Mean of the input rounded to two decimal places; 0 for an empty slice.
pub fn calculate_avg(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (mean * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_is_linear_in_distance() {
        for ptype in PropulsionType::ALL {
            let single = cost(ptype, 1_000.0);
            assert!((cost(ptype, 2_000.0) - 2.0 * single).abs() < 1e-9);
            assert_eq!(cost(ptype, 0.0), 0.0);
        }
    }

    #[test]
    fn emission_is_linear_in_distance() {
        for ptype in PropulsionType::ALL {
            let single = emission(ptype, 1_000.0);
            assert!((emission(ptype, 3_000.0) - 3.0 * single).abs() < 1e-9);
            assert_eq!(emission(ptype, 0.0), 0.0);
        }
    }

    #[test]
    fn ic_is_most_expensive_and_ev_cleanest() {
        let distance = 12_500.0;
        assert!(cost(PropulsionType::Ic, distance) > cost(PropulsionType::Hydrogen, distance));
        assert!(cost(PropulsionType::Hydrogen, distance) > cost(PropulsionType::Ev, distance));
        assert!(
            emission(PropulsionType::Ic, distance) > emission(PropulsionType::Hydrogen, distance)
        );
        assert!(
            emission(PropulsionType::Hydrogen, distance) > emission(PropulsionType::Ev, distance)
        );
    }

    #[test]
    fn calculate_avg_of_empty_input_is_zero() {
        assert_eq!(calculate_avg(&[]), 0.0);
    }

    #[test]
    fn calculate_avg_rounds_to_two_decimals() {
        assert_eq!(calculate_avg(&[2.0, 4.0]), 3.00);
        assert_eq!(calculate_avg(&[1.0, 2.0, 2.0]), 1.67);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_type() -> impl Strategy<Value = PropulsionType> {
            prop::sample::select(PropulsionType::ALL.to_vec())
        }

        proptest! {
            #[test]
            fn prop_cost_monotone_in_distance(
                ptype in any_type(),
                d1 in 0.0..1.0e7,
                d2 in 0.0..1.0e7,
            ) {
                let (lo, hi) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
                prop_assert!(cost(ptype, lo) <= cost(ptype, hi));
                prop_assert!(emission(ptype, lo) <= emission(ptype, hi));
            }

            #[test]
            fn prop_cost_non_negative(ptype in any_type(), d in 0.0..1.0e7) {
                prop_assert!(cost(ptype, d) >= 0.0);
                prop_assert!(emission(ptype, d) >= 0.0);
            }

            #[test]
            fn prop_avg_between_min_and_max(
                values in prop::collection::vec(0.0..1.0e5, 1..32)
            ) {
                let avg = calculate_avg(&values);
                let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                // Rounding may push the mean past the bounds by half a cent.
                prop_assert!(avg >= min - 0.005 && avg <= max + 0.005);
            }
        }
    }
}
