//! # Wizard Navigator
//!
//! Tracks the current step and the orthogonal edit flag.
//!
//! - Linear flow: completing a section moves to its successor, and the last
//!   section leads to review.
//! - Edit flow: entered from review for one section. Completing it returns
//!   straight to review and clears the flag.
//!
//! Reachability is derived from the form: a step is reachable when every
//! section before it validates. All transitions are synchronous.

use crate::validation;
use crate::{EnrolError, FormData, Section, Step};
use serde::{Deserialize, Serialize};

/// Navigator state, persisted per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigator {
    current: Step,
    is_editing: bool,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            current: Step::Personal,
            is_editing: false,
        }
    }
}

impl Navigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Step {
        self.current
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    /// Transition after `section` was saved successfully.
    pub fn complete_step(&mut self, section: Section) -> Step {
        self.current = if self.is_editing {
            self.is_editing = false;
            Step::Review
        } else {
            section.step().next().unwrap_or(Step::Review)
        };
        self.current
    }

    /// Enter edit mode for one section, bypassing order checks.
    ///
    /// Edit mode is entered from review, so review must be reachable.
    pub fn begin_edit(&mut self, section: Section, form: &FormData) -> Result<(), EnrolError> {
        if !Self::is_reachable(Step::Review, form) {
            return Err(EnrolError::StepLocked(Step::Review));
        }
        self.is_editing = true;
        self.current = section.step();
        Ok(())
    }

    /// Direct navigation to a step.
    ///
    /// The reachability guard applies here too; the only bypass is the
    /// section currently being edited. Going to review ends edit mode.
    pub fn goto(&mut self, step: Step, form: &FormData) -> Result<Step, EnrolError> {
        let edit_target = self.is_editing && step == self.current;
        if !edit_target && !Self::is_reachable(step, form) {
            return Err(EnrolError::StepLocked(step));
        }
        if step == Step::Review {
            self.is_editing = false;
        }
        self.current = step;
        Ok(step)
    }

    /// The first step always; any other only if all earlier sections validate.
    #[must_use]
    pub fn is_reachable(step: Step, form: &FormData) -> bool {
        Section::ALL
            .iter()
            .take_while(|section| section.step() < step)
            .all(|section| validation::is_complete(*section, form.section(*section)))
    }

    /// Menu data: one entry per step.
    #[must_use]
    pub fn progress(&self, form: &FormData) -> Vec<StepStatus> {
        Step::ALL
            .iter()
            .map(|&step| StepStatus {
                step,
                title: step.title(),
                completed: step
                    .section()
                    .is_some_and(|s| validation::is_complete(s, form.section(s))),
                reachable: Self::is_reachable(step, form),
                current: step == self.current,
            })
            .collect()
    }
}

/// One navigation menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub step: Step,
    pub title: &'static str,
    pub completed: bool,
    /// Whether the menu entry is clickable.
    pub reachable: bool,
    pub current: bool,
}
