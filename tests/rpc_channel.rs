//! Drives the plugin over an in-memory msgpack-rpc channel, with the test
//! playing the Neovim side.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use cfc_nvim::config::Config;
use cfc_nvim::extension::{DecorationBridge, Extension};
use cfc_nvim::host::{run_notification_loop, PluginHandler};
use cfc_nvim::store::MemoryState;
use nvim_rs::compat::tokio::Compat;
use nvim_rs::{Neovim, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio_util::compat::{TokioAsyncReadCompatExt, TokioAsyncWriteCompatExt};

type PipeWriter = Compat<WriteHalf<DuplexStream>>;

const HISTORY_VIEW: &str = "cfc.colorsHistoryView";

/// The Neovim end of the channel.
struct FakeNvim {
    reader: ReadHalf<DuplexStream>,
    writer: WriteHalf<DuplexStream>,
    buffer: Vec<u8>,
}

impl FakeNvim {
    async fn send(&mut self, message: Value) {
        let mut bytes = Vec::new();
        rmpv::encode::write_value(&mut bytes, &message).unwrap();
        self.writer.write_all(&bytes).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn recv(&mut self) -> Value {
        loop {
            let mut cursor = Cursor::new(&self.buffer[..]);
            if let Ok(value) = rmpv::decode::read_value(&mut cursor) {
                let consumed = cursor.position() as usize;
                self.buffer.drain(..consumed);
                return value;
            }
            let mut chunk = [0u8; 4096];
            let read = self.reader.read(&mut chunk).await.unwrap();
            assert!(read > 0, "plugin closed the channel");
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    async fn request(&mut self, msgid: u64, method: &str, params: Vec<Value>) {
        self.send(Value::Array(vec![
            Value::from(0),
            Value::from(msgid),
            Value::from(method),
            Value::Array(params),
        ]))
        .await;
    }

    async fn notify(&mut self, method: &str, params: Vec<Value>) {
        self.send(Value::Array(vec![
            Value::from(2),
            Value::from(method),
            Value::Array(params),
        ]))
        .await;
    }

    async fn respond(&mut self, msgid: u64, result: Value) {
        self.send(Value::Array(vec![
            Value::from(1),
            Value::from(msgid),
            Value::Nil,
            result,
        ]))
        .await;
    }

    /// Waits for the response to `msgid` and returns its result.
    async fn response(&mut self, msgid: u64) -> Value {
        let message = self.recv().await;
        let fields = message.as_array().unwrap();
        assert_eq!(fields[0].as_u64(), Some(1), "expected a response: {}", message);
        assert_eq!(fields[1].as_u64(), Some(msgid));
        assert!(fields[2].is_nil(), "request failed: {}", fields[2]);
        fields[3].clone()
    }

    /// Waits for an `nvim_exec_lua` call and returns its msgid, code and
    /// arguments.
    async fn exec_lua_call(&mut self) -> (u64, String, Vec<Value>) {
        let message = self.recv().await;
        let fields = message.as_array().unwrap();
        assert_eq!(fields[0].as_u64(), Some(0), "expected a request: {}", message);
        assert_eq!(fields[2].as_str(), Some("nvim_exec_lua"));
        let params = fields[3].as_array().unwrap();
        (
            fields[1].as_u64().unwrap(),
            params[0].as_str().unwrap().to_string(),
            params[1].as_array().unwrap().clone(),
        )
    }
}

fn start_plugin() -> FakeNvim {
    let extension =
        Arc::new(Extension::activate(Config::default(), Box::new(MemoryState::new())).unwrap());
    let (plugin_end, nvim_end) = tokio::io::duplex(64 * 1024);
    let (plugin_read, plugin_write) = tokio::io::split(plugin_end);

    let (decorations, _requests) = DecorationBridge::channel();
    let (handler, notifications) = PluginHandler::<PipeWriter>::new(extension.clone(), decorations);
    let (_neovim, io) = Neovim::<PipeWriter>::new(
        plugin_read.compat(),
        plugin_write.compat_write(),
        handler,
    );
    tokio::spawn(io);
    tokio::spawn(run_notification_loop(extension, notifications));

    let (reader, writer) = tokio::io::split(nvim_end);
    FakeNvim {
        reader,
        writer,
        buffer: Vec::new(),
    }
}

#[tokio::test]
async fn test_requests_are_answered_while_a_panel_update_is_pending() {
    let mut nvim = start_plugin();

    nvim.request(1, "resolveView", vec![Value::from(HISTORY_VIEW)]).await;
    assert_eq!(nvim.response(1).await, Value::Array(Vec::new()));

    nvim.notify(
        "panel",
        vec![
            Value::from(HISTORY_VIEW),
            Value::from(r#"{"type":"historyColorAdded","value":"red"}"#),
        ],
    )
    .await;

    let (call_id, code, args) = nvim.exec_lua_call().await;
    assert!(code.contains("panel_update"));
    assert_eq!(args[0].as_str(), Some(HISTORY_VIEW));
    assert_eq!(args[1].as_str(), Some(r#"{"type":"refreshHistory","value":["red"]}"#));
    assert_eq!(
        args[2],
        Value::Map(vec![(Value::from("red"), Value::from("#ff0000"))])
    );

    // The panel update is still running on the Neovim side.
    nvim.request(
        2,
        "hover",
        vec![Value::from("css"), Value::from("#fff"), Value::from(0)],
    )
    .await;
    let hover = tokio::time::timeout(Duration::from_secs(3), nvim.response(2))
        .await
        .expect("hover request blocked behind the panel notification");
    assert!(hover.as_str().unwrap().starts_with("**HEX:** #fff"));

    nvim.respond(call_id, Value::Nil).await;

    nvim.request(3, "resolveView", vec![Value::from(HISTORY_VIEW)]).await;
    assert_eq!(
        nvim.response(3).await,
        Value::Array(vec![Value::from("red")])
    );
}

#[tokio::test]
async fn test_commands_run_in_order() {
    let mut nvim = start_plugin();

    nvim.request(1, "resolveView", vec![Value::from(HISTORY_VIEW)]).await;
    nvim.response(1).await;

    for color in ["blue", "green"] {
        nvim.notify(
            "command",
            vec![
                Value::from("cfc.addColorToHistory"),
                Value::Array(vec![Value::from(color)]),
            ],
        )
        .await;
    }

    let (first_id, _, first_args) = nvim.exec_lua_call().await;
    assert_eq!(first_args[1].as_str(), Some(r#"{"type":"refreshHistory","value":["blue"]}"#));
    nvim.respond(first_id, Value::Nil).await;

    let (second_id, _, second_args) = nvim.exec_lua_call().await;
    assert_eq!(
        second_args[1].as_str(),
        Some(r#"{"type":"refreshHistory","value":["blue","green"]}"#)
    );
    nvim.respond(second_id, Value::Nil).await;

    nvim.request(2, "resolveView", vec![Value::from(HISTORY_VIEW)]).await;
    assert_eq!(
        nvim.response(2).await,
        Value::Array(vec![Value::from("blue"), Value::from("green")])
    );
}
