//! Text rendering of session events for the terminal.

use groove_shared::protocol::{RequestStatus, TransportAction};

use crate::{
    reconcile::{Outcome, RoomView},
    session::SessionEvent,
};

/// One or more lines to print; `None` for events not worth showing.
pub fn render(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Notice(message) => Some(format!("* {message}")),
        SessionEvent::Rejected { command, code, message } => {
            Some(format!("! {command} rejected ({code:?}): {message}"))
        }
        SessionEvent::Room(outcome) => render_outcome(outcome),
        SessionEvent::View(view) => Some(render_view(view)),
    }
}

fn render_outcome(outcome: &Outcome) -> Option<String> {
    match outcome {
        Outcome::Ignored | Outcome::Synced => None,
        Outcome::Queue => Some("* queue updated".to_string()),
        Outcome::Track(Some(track)) => Some(format!("♪ now playing: {}", track.title)),
        Outcome::Track(None) => Some("♪ queue finished".to_string()),
        Outcome::Transport(action) => Some(
            match action {
                TransportAction::Play => "▶ play",
                TransportAction::Pause => "⏸ pause",
                TransportAction::Seek => "⇥ seek",
            }
            .to_string(),
        ),
        Outcome::DjSet => Some("* DJs changed".to_string()),
        Outcome::Requests => Some("* song requests updated".to_string()),
        Outcome::Participants => Some("* listeners changed".to_string()),
        Outcome::Reaction(reaction) => {
            Some(format!("{} {}", reaction.display_name, reaction.emoji))
        }
        Outcome::Deleted => Some("* the room was deleted".to_string()),
    }
}

fn clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn render_view(view: &RoomView) -> String {
    let mut lines = Vec::new();
    let role = if view.is_dj { " [DJ]" } else { "" };
    lines.push(format!("# {} ({}){}", view.name, view.room_id, role));

    match &view.current {
        Some(track) => lines.push(format!(
            "{} {} {}/{}",
            if view.is_playing { "▶" } else { "⏸" },
            track.title,
            clock(view.position),
            clock(view.duration)
        )),
        None => lines.push("nothing playing".to_string()),
    }

    if view.queue.is_empty() {
        lines.push("queue is empty".to_string());
    }
    for line in &view.queue {
        match line.entry_id {
            Some(id) => lines.push(format!("  {id:>4}  {}", line.track.title)),
            None => lines.push(format!("     …  {} (sending)", line.track.title)),
        }
    }

    for request in &view.requests {
        let status = match request.status {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
        };
        lines.push(format!(
            "  request {} {} by {} ({status})",
            request.request_id, request.track.title, request.requester_identity
        ));
    }
    for track in &view.pending_requests {
        lines.push(format!("  request … {} (sending)", track.title));
    }

    lines.push(format!("DJs: {}", view.dj_set.join(", ")));
    lines.push(format!("listening: {}", view.listeners.join(", ")));
    lines.join("\n")
}
