//! Progress events to percentage

use super::surface::ProgressIndicator;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub current: u64,
    pub total: u64,
    pub percent: u8,
}

/// Reflect the latest reported fraction on the indicator.
///
/// `total == 0` leaves both the state and the indicator untouched. Later
/// reports may be lower than earlier ones; they are shown as reported.
pub fn on_progress(
    current: u64,
    total: u64,
    state: &mut ProgressState,
    indicator: &mut ProgressIndicator,
) {
    if total == 0 {
        return;
    }

    let percent = percent_of(current, total);
    *state = ProgressState {
        current,
        total,
        percent,
    };
    indicator.set(percent);
}

fn percent_of(current: u64, total: u64) -> u8 {
    let ratio = current as f64 / total as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds() {
        let mut state = ProgressState::default();
        let mut bar = ProgressIndicator::default();

        on_progress(1, 3, &mut state, &mut bar);
        assert_eq!(bar.value, 33);
        on_progress(2, 3, &mut state, &mut bar);
        assert_eq!(bar.value, 67);
        on_progress(145, 357, &mut state, &mut bar);
        assert_eq!(bar.value, 41);
        assert_eq!(
            state,
            ProgressState {
                current: 145,
                total: 357,
                percent: 41
            }
        );
    }

    #[test]
    fn test_zero_total_is_noop() {
        let mut state = ProgressState::default();
        let mut bar = ProgressIndicator::default();
        on_progress(5, 10, &mut state, &mut bar);
        let updates = bar.update_count();

        for current in [0, 1, 7, u64::MAX] {
            on_progress(current, 0, &mut state, &mut bar);
        }

        assert_eq!(bar.update_count(), updates);
        assert_eq!(bar.value, 50);
        assert_eq!(state.total, 10);
    }

    #[test]
    fn test_non_monotonic_reports_pass_through() {
        let mut state = ProgressState::default();
        let mut bar = ProgressIndicator::default();
        on_progress(8, 10, &mut state, &mut bar);
        on_progress(3, 10, &mut state, &mut bar);
        assert_eq!(bar.value, 30);
    }

    #[test]
    fn test_current_above_total_is_clamped() {
        let mut state = ProgressState::default();
        let mut bar = ProgressIndicator::default();
        on_progress(12, 10, &mut state, &mut bar);
        assert_eq!(bar.value, 100);
        assert_eq!(state.percent, 100);
    }
}
