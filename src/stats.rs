//! Chi-square test of independence for 2x2 retention tables.
//!
//! The p-value uses the closed form of the chi-square survival function
//! with one degree of freedom, `erfc(sqrt(x / 2))`.

use crate::error::AnalysisError;
use crate::models::{SignificanceTest, VariantRetention};

/// Rows are variants, columns are (retained, not retained).
pub type ContingencyTable = [[u64; 2]; 2];

/// Rounds half to even, so 3.125 becomes 3.12 and 3.135 becomes 3.14.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

pub fn contingency_table(
    control: &VariantRetention,
    treatment: &VariantRetention,
) -> ContingencyTable {
    let row = |v: &VariantRetention| {
        let retained = v.retained_d1 as u64;
        let total = v.total_users as u64;
        [retained, total.saturating_sub(retained)]
    };
    [row(control), row(treatment)]
}

/// Percentage-point difference, treatment minus control.
pub fn lift(control_pct: f64, treatment_pct: f64) -> f64 {
    round_to(treatment_pct - control_pct, 2)
}

pub fn chi2_contingency_2x2(
    table: ContingencyTable,
    yates: bool,
) -> Result<SignificanceTest, AnalysisError> {
    let row_totals = [
        (table[0][0] + table[0][1]) as f64,
        (table[1][0] + table[1][1]) as f64,
    ];
    let col_totals = [
        (table[0][0] + table[1][0]) as f64,
        (table[0][1] + table[1][1]) as f64,
    ];
    let grand_total = row_totals[0] + row_totals[1];

    if row_totals.contains(&0.0) || col_totals.contains(&0.0) {
        return Err(AnalysisError::DegenerateTable(table));
    }

    let mut expected = [[0.0; 2]; 2];
    let mut statistic = 0.0;
    for (i, row) in table.iter().enumerate() {
        for (j, &cell) in row.iter().enumerate() {
            let exp = row_totals[i] * col_totals[j] / grand_total;
            expected[i][j] = exp;

            let mut observed = cell as f64;
            if yates {
                let diff = exp - observed;
                observed += diff.signum() * diff.abs().min(0.5);
            }
            statistic += (observed - exp).powi(2) / exp;
        }
    }

    if expected.iter().flatten().any(|&exp| exp < 5.0) {
        tracing::debug!(?expected, "expected cell count below 5; chi-square approximation is rough");
    }

    Ok(SignificanceTest {
        statistic,
        p_value: chi2_sf_one_dof(statistic),
        dof: 1,
        expected,
    })
}

pub fn chi2_sf_one_dof(statistic: f64) -> f64 {
    if statistic <= 0.0 {
        return 1.0;
    }
    erfc((statistic / 2.0).sqrt()).clamp(0.0, 1.0)
}

/// Complementary error function, Chebyshev fit with fractional error below
/// 1.2e-7 everywhere.
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let ans = t * poly.exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(variant: &str, total: usize, retained: usize) -> VariantRetention {
        VariantRetention {
            variant: variant.to_string(),
            total_users: total,
            retained_d1: retained,
            d1_retention_pct: round_to(retained as f64 / total as f64 * 100.0, 2),
        }
    }

    #[test]
    fn rounding_to_two_places() {
        assert_eq!(round_to(33.333333, 2), 33.33);
        assert_eq!(round_to(66.666666, 2), 66.67);
        assert_eq!(round_to(0.123456, 4), 0.1235);
    }

    #[test]
    fn exact_ties_round_to_even() {
        assert_eq!(round_to(1.0 / 32.0 * 100.0, 2), 3.12);
        assert_eq!(round_to(453.0 / 800.0 * 100.0, 2), 56.62);
        assert_eq!(round_to(3.0 / 32.0 * 100.0, 2), 9.38);
        assert_eq!(lift(0.0, 3.125), 3.12);
    }

    #[test]
    fn lift_is_treatment_minus_control() {
        assert_eq!(lift(50.0, 100.0), 50.0);
        assert_eq!(lift(55.25, 52.1), -3.15);
    }

    #[test]
    fn erfc_reference_values() {
        assert!((erfc(0.0) - 1.0).abs() < 1e-6);
        assert!((erfc(1.0) - 0.157_299_207).abs() < 1e-6);
        assert!((erfc(-1.0) - 1.842_700_793).abs() < 1e-6);
        assert!(erfc(6.0) < 1e-15);
    }

    #[test]
    fn critical_value_maps_to_alpha() {
        assert!((chi2_sf_one_dof(3.841_458_820_694_124) - 0.05).abs() < 1e-6);
        assert!((chi2_sf_one_dof(6.634_896_601_021_214) - 0.01).abs() < 1e-6);
        assert_eq!(chi2_sf_one_dof(0.0), 1.0);
    }

    #[test]
    fn builds_table_from_variant_rows() {
        let table = contingency_table(&row("A", 2, 1), &row("B", 1, 1));
        assert_eq!(table, [[1, 1], [1, 0]]);
    }

    #[test]
    fn yates_corrected_statistic() {
        let test = chi2_contingency_2x2([[10, 90], [40, 60]], true).unwrap();
        // expected 25/75 per row; |15| shrinks to 14.5 under correction
        let expected_stat = 14.5f64.powi(2) * (2.0 / 25.0 + 2.0 / 75.0);
        assert!((test.statistic - expected_stat).abs() < 1e-9);
        assert_eq!(test.dof, 1);
        assert_eq!(test.expected, [[25.0, 75.0], [25.0, 75.0]]);
        assert!(test.p_value < 0.001);
    }

    #[test]
    fn uncorrected_statistic() {
        let test = chi2_contingency_2x2([[10, 90], [40, 60]], false).unwrap();
        let expected_stat = 15.0f64.powi(2) * (2.0 / 25.0 + 2.0 / 75.0);
        assert!((test.statistic - expected_stat).abs() < 1e-9);
    }

    #[test]
    fn tiny_tables_still_get_a_p_value() {
        let test = chi2_contingency_2x2([[1, 1], [1, 0]], true).unwrap();
        assert!(test.statistic.abs() < 1e-12);
        assert!((test.p_value - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_margin_is_degenerate() {
        let err = chi2_contingency_2x2([[5, 0], [3, 0]], true).unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateTable(_)));
        assert!(chi2_contingency_2x2([[0, 0], [3, 4]], true).is_err());
    }
}
