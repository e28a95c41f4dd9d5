use std::time::Duration;

use folio::code::code_blocks;
use folio::copy::{
    Clipboard, ClipboardError, CommandClipboard, CopyAction, CopyState, ManualClock,
    MemoryClipboard, REVERT_AFTER,
};
use folio::{normalize, render};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn copied_state_lasts_exactly_two_seconds() {
    assert_eq!(REVERT_AFTER, ms(2000));

    let clock = ManualClock::new();
    let mut clipboard = MemoryClipboard::new();
    let mut action = CopyAction::new("echo hi");

    action.copy(&mut clipboard, &clock).expect("copy");
    clock.advance(ms(1999));
    assert!(matches!(action.poll(&clock), CopyState::Copied { .. }));
    clock.advance(ms(1));
    assert_eq!(action.poll(&clock), CopyState::Idle);
    assert_eq!(action.label(), "Copy");
}

#[test]
fn copying_again_restarts_the_window() {
    let clock = ManualClock::new();
    let mut clipboard = MemoryClipboard::new();
    let mut action = CopyAction::new("x");

    action.copy(&mut clipboard, &clock).expect("first copy");
    clock.advance(ms(1000));
    action.copy(&mut clipboard, &clock).expect("second copy");

    // 2s after the first copy, 1s after the second.
    clock.advance(ms(1000));
    assert!(matches!(action.poll(&clock), CopyState::Copied { .. }));
    assert_eq!(action.label(), "Copied!");

    clock.advance(ms(1000));
    assert_eq!(action.poll(&clock), CopyState::Idle);
    assert_eq!(clipboard.writes, vec!["x", "x"]);
}

#[test]
fn failed_copy_is_swallowed_and_stays_idle() {
    let clock = ManualClock::new();
    let mut clipboard = MemoryClipboard::failing();
    let mut action = CopyAction::new("x");

    assert!(action.copy(&mut clipboard, &clock).is_none());
    assert_eq!(action.state(), CopyState::Idle);
    assert_eq!(action.next_deadline(), None);
}

#[test]
fn failed_copy_does_not_cancel_pending_revert() {
    struct Flaky {
        calls: usize,
    }
    impl Clipboard for Flaky {
        fn write_text(&mut self, _text: &str) -> Result<(), ClipboardError> {
            self.calls += 1;
            if self.calls > 1 {
                return Err(ClipboardError::Unavailable("busy".to_string()));
            }
            Ok(())
        }
    }

    let clock = ManualClock::new();
    let mut clipboard = Flaky { calls: 0 };
    let mut action = CopyAction::new("x");

    let timer = action.copy(&mut clipboard, &clock).expect("first copy");
    clock.advance(ms(500));
    assert!(action.copy(&mut clipboard, &clock).is_none());
    assert_eq!(action.next_deadline(), Some(timer.due()));

    clock.advance(ms(1500));
    assert_eq!(action.poll(&clock), CopyState::Idle);
}

#[test]
fn custom_revert_window() {
    let clock = ManualClock::new();
    let mut clipboard = MemoryClipboard::new();
    let mut action = CopyAction::new("x").with_revert_after(ms(50));

    action.copy(&mut clipboard, &clock).expect("copy");
    clock.advance(ms(50));
    assert_eq!(action.poll(&clock), CopyState::Idle);
}

#[test]
fn payload_is_the_decoded_raw_body() {
    let normalized =
        normalize("<p>```rust</p><p>if a &lt; b {</p><p>    swap();</p><p>}</p><p>```</p>");
    let blocks = render(&normalized);
    let code = code_blocks(&blocks);
    assert_eq!(code.len(), 1);

    let clock = ManualClock::new();
    let mut clipboard = MemoryClipboard::new();
    let mut action = CopyAction::for_block(code[0]);
    action.copy(&mut clipboard, &clock).expect("copy");
    assert_eq!(clipboard.last(), Some("if a < b {\n    swap();\n}"));
}

#[cfg(unix)]
#[test]
fn command_clipboard_reports_exit_status() {
    let mut ok = CommandClipboard::new("cat", vec![]);
    ok.write_text("hello").expect("cat accepts stdin");

    let mut failing = CommandClipboard::new(
        "sh",
        vec!["-c".to_string(), "cat >/dev/null; exit 3".to_string()],
    );
    let err = failing.write_text("hello").expect_err("non-zero exit");
    assert!(matches!(err, ClipboardError::Status { .. }), "{err}");
}

#[cfg(unix)]
#[test]
fn command_clipboard_reports_write_failure() {
    // the program exits without reading, so a payload larger than the pipe
    // buffer cannot be delivered.
    let mut closed = CommandClipboard::new("sh", vec!["-c".to_string(), "exit 0".to_string()]);
    let payload = "x".repeat(1 << 20);
    let err = closed.write_text(&payload).expect_err("stdin is closed");
    assert!(matches!(err, ClipboardError::Write { .. }), "{err}");

    // the clipboard stays usable afterwards.
    let mut ok = CommandClipboard::new("cat", vec![]);
    ok.write_text("hello").expect("cat accepts stdin");
}
