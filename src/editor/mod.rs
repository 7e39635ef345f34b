//! Rich-text editing surface and its synchronization boundary.
//!
//! The live surface (a content-editable element, or [`HeadlessSurface`])
//! is mutable state that lives outside the session. The session owns the
//! authoritative narrative string; the surface is a projection of it. The
//! [`Synchronizer`] sits between the two and decides when an incoming value
//! may overwrite the surface.
//!
//! ## Why not just diff value vs. surface?
//!
//! Every keystroke makes the surface run one step ahead of the authoritative
//! string until the change is emitted and echoed back. Overwriting the
//! surface whenever the two differ resets the caret to the start of the
//! document on each keystroke. The synchronizer therefore remembers the last
//! value it emitted and treats an echo of it as "already applied".
//!
//! ## Conflict policy
//!
//! A value that is *not* an echo is an external change (analysis replace,
//! reset, programmatic load). When the surface is unfocused it is applied
//! immediately. When focused, [`SyncPolicy`] decides:
//!
//! | Policy | Focused external change |
//! |--------|-------------------------|
//! | [`SyncPolicy::ForceExternal`] (default) | applied now; caret position is lost |
//! | [`SyncPolicy::DeferWhileFocused`] | parked, applied on [`Synchronizer::blur`] |
//!
//! Under `DeferWhileFocused`, a user edit emitted while a value is parked
//! discards the parked value: the user's text becomes authoritative.

mod headless;

pub use headless::HeadlessSurface;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Formatting commands applied to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    UnorderedList,
    OrderedList,
}

impl FormatCommand {
    /// Browser `execCommand` identifier for this command.
    pub fn command_name(self) -> &'static str {
        match self {
            FormatCommand::Bold => "bold",
            FormatCommand::Italic => "italic",
            FormatCommand::Underline => "underline",
            FormatCommand::UnorderedList => "insertUnorderedList",
            FormatCommand::OrderedList => "insertOrderedList",
        }
    }
}

/// A live, externally mutable rich-text surface.
pub trait EditingSurface {
    /// Current markup of the surface.
    fn inner_html(&self) -> String;

    /// Replace the whole surface content. Implementations may lose the caret.
    fn set_inner_html(&mut self, html: &str);

    fn has_focus(&self) -> bool;

    fn focus(&mut self);

    /// Apply a formatting command to the current selection.
    fn apply_format(&mut self, command: FormatCommand);
}

/// Receives every user-driven change of the surface.
pub trait ChangeSink: Send + Sync {
    fn on_change(&self, html: &str);
}

/// What to do with an external change while the surface holds focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncPolicy {
    /// Apply immediately, accepting caret loss.
    #[default]
    ForceExternal,
    /// Park the value and apply it when focus is lost.
    DeferWhileFocused,
}

/// Result of a [`Synchronizer::render`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Surface already shows the value.
    InSync,
    /// Value is the synchronizer's own last emitted change; surface untouched.
    OwnEcho,
    /// Value was written into the surface.
    Applied,
    /// Surface is focused and the value was parked until blur.
    Deferred,
}

/// Owns an [`EditingSurface`] and reconciles it with the authoritative string.
pub struct Synchronizer<S: EditingSurface> {
    surface: S,
    sink: Arc<dyn ChangeSink>,
    policy: SyncPolicy,
    last_emitted: Option<String>,
    deferred: Option<String>,
}

impl<S: EditingSurface> Synchronizer<S> {
    /// Take ownership of `surface` and initialise it with `initial`.
    pub fn mount(mut surface: S, initial: &str, sink: Arc<dyn ChangeSink>, policy: SyncPolicy) -> Self {
        surface.set_inner_html(initial);
        Self {
            surface,
            sink,
            policy,
            last_emitted: None,
            deferred: None,
        }
    }

    /// Bring the surface in line with the authoritative `value`.
    pub fn render(&mut self, value: &str) -> RenderOutcome {
        if self.surface.inner_html() == value {
            self.deferred = None;
            return RenderOutcome::InSync;
        }

        if self.last_emitted.as_deref() == Some(value) {
            return RenderOutcome::OwnEcho;
        }

        if self.surface.has_focus() && self.policy == SyncPolicy::DeferWhileFocused {
            debug!("Surface focused; deferring external change ({} bytes)", value.len());
            self.deferred = Some(value.to_string());
            return RenderOutcome::Deferred;
        }

        self.apply_external(value);
        RenderOutcome::Applied
    }

    /// Read the surface after user input and emit it.
    pub fn handle_input(&mut self) {
        self.deferred = None;
        self.emit();
    }

    /// Apply `command` to the selection, keep focus, and emit the result.
    pub fn format(&mut self, command: FormatCommand) {
        self.surface.apply_format(command);
        self.surface.focus();
        self.deferred = None;
        self.emit();
    }

    /// Notify the synchronizer that the surface lost focus.
    ///
    /// Applies a parked external value, if any.
    pub fn blur(&mut self) -> Option<RenderOutcome> {
        let value = self.deferred.take()?;
        if self.surface.inner_html() == value {
            return Some(RenderOutcome::InSync);
        }
        self.apply_external(&value);
        Some(RenderOutcome::Applied)
    }

    /// Whether an external value is waiting for blur.
    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct access for user-driven mutation (typing, selection).
    ///
    /// Call [`Synchronizer::handle_input`] afterwards to emit the change.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn apply_external(&mut self, value: &str) {
        self.surface.set_inner_html(value);
        // An older emitted value may legitimately come back as an external change.
        self.last_emitted = None;
        self.deferred = None;
    }

    fn emit(&mut self) {
        let html = self.surface.inner_html();
        self.sink.on_change(&html);
        self.last_emitted = Some(html);
    }
}
