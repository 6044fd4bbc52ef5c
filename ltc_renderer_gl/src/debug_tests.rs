//! Unit tests for GL error tracking

use super::*;

#[test]
fn test_track_groups_identical_messages() {
    let mut tracker = ErrorTracker::new();

    assert_eq!(tracker.track("glTexStorage2D raised GL_INVALID_VALUE"), 1);
    assert_eq!(tracker.track("glTexStorage2D raised GL_INVALID_VALUE"), 2);
    assert_eq!(tracker.track("glDrawElements raised GL_INVALID_OPERATION"), 1);

    assert_eq!(tracker.stats(), GlErrorStats { errors: 3, distinct: 2 });
}

#[test]
fn test_reset_clears_grouping() {
    let mut tracker = ErrorTracker::new();
    tracker.track("same");
    tracker.reset();

    assert_eq!(tracker.stats(), GlErrorStats::default());
    assert_eq!(tracker.grouped(), 0);
    assert_eq!(tracker.track("same"), 1);
}

#[test]
fn test_trackers_are_independent() {
    let mut first = ErrorTracker::new();
    let second = ErrorTracker::new();

    first.track("glClear raised GL_INVALID_ENUM");

    assert_eq!(first.stats().errors, 1);
    assert_eq!(second.stats(), GlErrorStats::default());
}

#[test]
fn test_grouping_table_is_bounded() {
    let mut tracker = ErrorTracker::new();
    for i in 0..MAX_GROUPED_MESSAGES * 3 {
        tracker.track(&format!("glUniform1i raised GL_INVALID_OPERATION at {}", i));
    }

    assert!(tracker.grouped() <= MAX_GROUPED_MESSAGES);
    let count = (MAX_GROUPED_MESSAGES * 3) as u32;
    assert_eq!(tracker.stats(), GlErrorStats { errors: count, distinct: count });

    // repeats of a message still grouped keep counting up
    let last = format!("glUniform1i raised GL_INVALID_OPERATION at {}", MAX_GROUPED_MESSAGES * 3 - 1);
    assert_eq!(tracker.track(&last), 2);
}
