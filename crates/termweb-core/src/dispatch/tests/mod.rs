use termweb_cdp::Channel;
use termweb_cdp::protocol::MouseButton;

use super::*;
use crate::testing::RecordingSink;

#[tokio::test]
async fn test_mouse_move_wire_shape() {
    let sink = RecordingSink::new();
    mouse_move(&sink, 10.0, 20.0, 1).await;

    let commands = sink.take();
    assert_eq!(commands.len(), 1);
    let cmd = &commands[0];
    assert_eq!(cmd.channel, Channel::Mouse);
    assert_eq!(cmd.method, "Input.dispatchMouseEvent");
    assert_eq!(cmd.params["type"], "mouseMoved");
    assert_eq!(cmd.params["x"], 10.0);
    assert_eq!(cmd.params["y"], 20.0);
    assert_eq!(cmd.params["buttons"], 1);
    assert!(cmd.params.get("button").is_none(), "moves carry no button");
    assert!(cmd.params.get("clickCount").is_none());
}

#[tokio::test]
async fn test_mouse_down_wire_shape() {
    let sink = RecordingSink::new();
    mouse_down(&sink, 5.0, 6.0, MouseButton::Left, 1, 2).await;

    let cmd = &sink.take()[0];
    assert_eq!(cmd.params["type"], "mousePressed");
    assert_eq!(cmd.params["button"], "left");
    assert_eq!(cmd.params["buttons"], 1);
    assert_eq!(cmd.params["clickCount"], 2);
}

#[tokio::test]
async fn test_mouse_up_wire_shape() {
    let sink = RecordingSink::new();
    mouse_up(&sink, 5.0, 6.0, MouseButton::Right, 0, 1).await;

    let cmd = &sink.take()[0];
    assert_eq!(cmd.params["type"], "mouseReleased");
    assert_eq!(cmd.params["button"], "right");
    assert_eq!(cmd.params["buttons"], 0);
    assert_eq!(cmd.params["clickCount"], 1);
}

#[tokio::test]
async fn test_mouse_wheel_wire_shape() {
    let sink = RecordingSink::new();
    mouse_wheel(&sink, 640.0, 360.0, -20.0).await;

    let cmd = &sink.take()[0];
    assert_eq!(cmd.params["type"], "mouseWheel");
    assert_eq!(cmd.params["deltaY"], -20.0);
    assert_eq!(cmd.params["deltaX"], 0.0);
    assert_eq!(cmd.params["x"], 640.0);
    assert_eq!(cmd.params["y"], 360.0);
}
