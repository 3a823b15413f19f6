//! Load-based capacity scaling

/// Effective capacity for a bucket under the given host load.
///
/// Stepwise multiplier table, evaluated top to bottom, first matching
/// row wins. The memory thresholds are not monotonic (0.89 sits above
/// 0.92); the table is kept literal, matching the deployed behavior.
pub fn scale_capacity(base_capacity: i64, cpu: f64, mem: f64) -> i64 {
    let multiplier = if cpu > 0.97 || mem > 0.97 {
        0.1
    } else if cpu > 0.95 || mem > 0.92 {
        0.2
    } else if cpu > 0.90 || mem > 0.90 {
        0.3
    } else if cpu > 0.85 || mem > 0.89 {
        0.4
    } else if cpu > 0.80 || mem > 0.87 {
        0.7
    } else if cpu > 0.75 || mem > 0.85 {
        0.8
    } else if cpu > 0.70 || mem > 0.80 {
        0.9
    } else {
        1.0
    };

    (base_capacity as f64 * multiplier).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_host_keeps_base_capacity() {
        assert_eq!(scale_capacity(100, 0.0, 0.0), 100);
        assert_eq!(scale_capacity(100, 0.70, 0.80), 100);
    }

    #[test]
    fn each_row_of_the_table() {
        // Driven by CPU alone
        assert_eq!(scale_capacity(100, 0.98, 0.0), 10);
        assert_eq!(scale_capacity(100, 0.96, 0.0), 20);
        assert_eq!(scale_capacity(100, 0.91, 0.0), 30);
        assert_eq!(scale_capacity(100, 0.86, 0.0), 40);
        assert_eq!(scale_capacity(100, 0.81, 0.0), 70);
        assert_eq!(scale_capacity(100, 0.76, 0.0), 80);
        assert_eq!(scale_capacity(100, 0.71, 0.0), 90);

        // Driven by memory alone
        assert_eq!(scale_capacity(100, 0.0, 0.98), 10);
        assert_eq!(scale_capacity(100, 0.0, 0.93), 20);
        assert_eq!(scale_capacity(100, 0.0, 0.91), 30);
        assert_eq!(scale_capacity(100, 0.0, 0.88), 70);
        assert_eq!(scale_capacity(100, 0.0, 0.86), 80);
        assert_eq!(scale_capacity(100, 0.0, 0.81), 90);
    }

    #[test]
    fn memory_thresholds_keep_their_literal_order() {
        // mem = 0.895 matches the 0.89 row before the 0.90 row can see it
        assert_eq!(scale_capacity(100, 0.0, 0.895), 40);
        // mem = 0.91 skips past 0.92 and lands on the 0.90 row
        assert_eq!(scale_capacity(100, 0.0, 0.91), 30);
    }

    #[test]
    fn effective_capacity_floors() {
        assert_eq!(scale_capacity(7, 0.96, 0.0), 1); // 7 * 0.2 = 1.4
        assert_eq!(scale_capacity(3, 0.98, 0.0), 0); // 3 * 0.1 = 0.3
    }

    #[test]
    fn boundary_values_do_not_match_their_own_row() {
        // Thresholds are strict comparisons
        assert_eq!(scale_capacity(100, 0.97, 0.97), 20);
        assert_eq!(scale_capacity(100, 0.70, 0.0), 100);
    }
}
