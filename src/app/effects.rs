use std::io::{Write, stdout};

use base64::Engine;

use crate::app::{App, Message, Model, ToastLevel};
use crate::app::worker::Workers;

impl App {
    pub(super) fn handle_message_side_effects(
        model: &mut Model,
        workers: &Workers,
        msg: &Message,
    ) {
        match msg {
            Message::Refresh => {
                // begin_refresh arms the spawn flag only on an idle -> busy
                // transition, so an overlapping refresh spawns nothing.
                if model.take_pending_refresh() {
                    workers.spawn_refresh();
                }
            }
            Message::OpenSelected => Self::open_selected_photo(model),
            Message::CopySummary => Self::copy_selected_summary(model),
            _ => {}
        }
    }

    fn open_selected_photo(model: &mut Model) {
        let Some(post) = model.selected_post() else {
            return;
        };
        let Some(url) = post.first_photo_url().map(ToOwned::to_owned) else {
            model.show_toast(ToastLevel::Info, "No photo on this post");
            return;
        };
        match open_external_link(&url) {
            Ok(()) => model.show_toast(ToastLevel::Info, format!("Opened {url}")),
            Err(err) => model.show_toast(ToastLevel::Error, format!("Open failed: {err}")),
        }
    }

    fn copy_selected_summary(model: &mut Model) {
        let Some(post) = model.selected_post() else {
            return;
        };
        let text = post.summary.clone();
        if text.is_empty() {
            model.show_toast(ToastLevel::Info, "Nothing to copy");
            return;
        }
        match copy_to_clipboard(&text) {
            Ok(()) => model.show_toast(ToastLevel::Info, "Copied summary"),
            Err(err) => model.show_toast(ToastLevel::Error, format!("Copy failed: {err}")),
        }
    }
}

fn open_external_link(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()?
            .wait()?;
        Ok(())
    }
    #[cfg(target_os = "windows")]
    {
        use std::process::Stdio;
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        return Ok(());
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()?
            .wait()?;
        Ok(())
    }
}

fn copy_to_clipboard(text: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        if copy_to_pbcopy(text).is_ok() {
            return Ok(());
        }
    }
    copy_to_clipboard_osc52(text)
}

#[cfg(target_os = "macos")]
fn copy_to_pbcopy(text: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};

    let mut child = Command::new("pbcopy").stdin(Stdio::piped()).spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other("pbcopy failed"))
    }
}

fn copy_to_clipboard_osc52(text: &str) -> std::io::Result<()> {
    let osc = osc52_sequence(text);
    let mut out = stdout();
    out.write_all(osc.as_bytes())?;
    out.flush()
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}

#[cfg(test)]
mod tests {
    use super::osc52_sequence;

    #[test]
    fn test_osc52_sequence_encodes_text() {
        let seq = osc52_sequence("hi");
        assert_eq!(seq, "\x1b]52;c;aGk=\x07");
    }
}
