//! Per-tick debugging geometry, collected while the `debug` feature is enabled.

use crate::math::Point2d;
use serde_json::json;
use std::cell::RefCell;

thread_local!(
    static DEBUG_FRAME: RefCell<Vec<serde_json::Value>> = Default::default();
);

/// Records a line to be drawn over the current tick.
pub fn debug_line(name: &str, p1: Point2d, p2: Point2d) {
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "line",
            "name": name,
            "p1": [p1.x, p1.y],
            "p2": [p2.x, p2.y],
        }))
    })
}

/// Takes everything recorded since the last call.
pub fn take_debug_frame() -> serde_json::Value {
    json!(DEBUG_FRAME.with(|frame| frame.take()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frames_are_drained() {
        debug_line("a", Point2d::new(0.0, 0.0), Point2d::new(1.0, 2.0));
        let frame = take_debug_frame();
        assert_eq!(frame[0]["name"], "a");
        assert_eq!(frame[0]["p2"][1], 2.0);
        assert_eq!(take_debug_frame(), json!([]));
    }
}
