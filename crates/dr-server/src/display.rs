//! Operator-facing console output.

use std::fmt::Write as _;
use std::net::SocketAddr;

use chrono::Local;
use dr_protocol::{DomInfo, PluginEvent};

use crate::ws::router::Presenter;

const RULE_WIDTH: usize = 60;

/// `====` rule, optionally framing a title.
pub fn separator(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    if title.is_empty() {
        rule
    } else {
        format!("{rule}\n{title}\n{rule}")
    }
}

/// Upper-cased section heading with blank lines around it.
pub fn section(title: &str) -> String {
    format!("\n{}\n", title.to_uppercase())
}

pub fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Multi-line record for one DOM element.
pub fn render_dom_info(info: &DomInfo, received_at: &str, text_preview_chars: usize) -> String {
    let mut out = String::new();
    let bb = &info.bounding_box;
    let _ = writeln!(out, "{}", separator("DOM ELEMENT INFORMATION"));
    let _ = writeln!(out, "Received at: {received_at}");
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(out, "URL          : {}", info.url);
    let _ = writeln!(out, "Tag Name     : {}", info.tag_name);
    let _ = writeln!(out, "ID           : {}", info.id);
    let _ = writeln!(out, "Class        : {}", info.class);
    let _ = writeln!(out, "Name         : {}", info.name);
    let _ = writeln!(out, "Text Content : {}", preview(&info.text_content, text_preview_chars));
    let _ = writeln!(out, "XPath        : {}", info.xpath);
    let _ = writeln!(out, "CSS Selector : {}", info.css_selector);
    let _ = writeln!(out, "Position     : ({:.2}, {:.2})", bb.x, bb.y);
    let _ = writeln!(out, "Size         : {:.2}x{:.2}", bb.width, bb.height);
    out.push_str(&separator(""));
    out
}

/// Prints relay events to stdout, framed the way the operator prompt expects.
pub struct ConsolePresenter {
    text_preview_chars: usize,
}

impl ConsolePresenter {
    pub fn new(text_preview_chars: usize) -> Self {
        Self { text_preview_chars }
    }

    fn banner(title: &str, line: String) {
        println!("{}", separator(title));
        println!("{line}");
        println!("{}", separator(""));
    }
}

impl Presenter for ConsolePresenter {
    fn dom_info(&self, _peer: SocketAddr, info: &DomInfo) {
        println!("{}", render_dom_info(info, &timestamp(), self.text_preview_chars));
    }

    fn plugin_event(&self, _peer: SocketAddr, event: PluginEvent) {
        let (title, verb) = match event {
            PluginEvent::Activated => ("PLUGIN ACTIVATED", "activated"),
            PluginEvent::Deactivated => ("PLUGIN DEACTIVATED", "deactivated"),
        };
        Self::banner(title, format!("Plugin {verb} at {}", timestamp()));
    }

    fn generic(&self, _peer: SocketAddr, text: &str) {
        println!("Received message: {text}");
    }

    fn agent_connected(&self, peer: SocketAddr) {
        Self::banner(
            "CONNECTION ESTABLISHED",
            format!("Agent {peer} connected at {}", timestamp()),
        );
    }

    fn agent_disconnected(&self, peer: SocketAddr) {
        Self::banner(
            "CONNECTION LOST",
            format!("Agent {peer} gone; waiting for browser agent connection... ({})", timestamp()),
        );
    }
}
