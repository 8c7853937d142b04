//! # Drop Zone
//!
//! The two ways a file reaches [`Workflow::submit_file`](crate::workflow::Workflow::submit_file):
//! dropping it on the drop target, or picking it with a file picker. Both are
//! equivalent; the drop zone only tracks whether a drag is in progress.

use crate::constants::{DROP_LABEL_ACTIVE, DROP_LABEL_IDLE, DROP_LABEL_UPLOADING};
use crate::types::ResumeFile;

/// A drag-and-drop event aimed at the drop target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
    Drop(Vec<ResumeFile>),
}

/// What the host should do after an event was handled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropOutcome {
    /// Whether the host's default file-open behaviour must be suppressed.
    pub prevent_default: bool,
    /// The file to submit, if the event delivered one.
    pub file: Option<ResumeFile>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DropZone {
    drag_active: bool,
}

impl DropZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn handle(&mut self, event: DragEvent) -> DropOutcome {
        let file = match event {
            DragEvent::Enter | DragEvent::Over => {
                self.drag_active = true;
                None
            }
            DragEvent::Leave => {
                self.drag_active = false;
                None
            }
            DragEvent::Drop(files) => {
                self.drag_active = false;
                files.into_iter().next()
            }
        };
        DropOutcome {
            prevent_default: true,
            file,
        }
    }

    /// The file-picker entry point. Only the first file is used.
    pub fn pick(&self, files: Vec<ResumeFile>) -> Option<ResumeFile> {
        files.into_iter().next()
    }

    /// The prompt shown on the drop target.
    pub fn label(&self, uploading: bool) -> &'static str {
        if uploading {
            DROP_LABEL_UPLOADING
        } else if self.drag_active {
            DROP_LABEL_ACTIVE
        } else {
            DROP_LABEL_IDLE
        }
    }
}
