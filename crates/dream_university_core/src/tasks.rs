//! crates/dream_university_core/src/tasks.rs
//!
//! The application checklist. Status changes are deliberately unrestricted:
//! any status may move to any other, which is what lets a student undo a
//! completed task.

use crate::domain::{AiAction, Task, TaskStatus};

/// Identifier of the task completed by locking a university.
pub const FINALIZE_SELECTION_TASK: &str = "2";
/// Identifier of the task with the inline "mark paid" action.
pub const APPLICATION_FEE_TASK: &str = "4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskBoard {
    tasks: Vec<Task>,
}

impl Default for TaskBoard {
    fn default() -> Self {
        Self::seeded()
    }
}

impl TaskBoard {
    /// The fixed roster every session starts with.
    pub fn seeded() -> Self {
        Self {
            tasks: vec![
                Task::new("1", "Draft Statement of Purpose", TaskStatus::Todo, "Oct 15")
                    .with_ai_action(AiAction::StatementOfPurpose),
                Task::new(
                    FINALIZE_SELECTION_TASK,
                    "Finalize University Selection",
                    TaskStatus::InProgress,
                    "Oct 20",
                ),
                Task::new("3", "Order Transcripts", TaskStatus::Done, "Sep 30"),
                Task::new(APPLICATION_FEE_TASK, "Pay Application Fee", TaskStatus::Todo, "Nov 01"),
            ],
        }
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Sets the status of the task with `id`. Unknown ids are a no-op.
    /// Returns whether a task was found.
    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.status = status;
                true
            }
            None => false,
        }
    }

    /// The first task tagged with `action`.
    pub fn task_for_action(&self, action: AiAction) -> Option<&Task> {
        self.tasks.iter().find(|t| t.ai_action() == Some(action))
    }

    pub fn progress(&self) -> u8 {
        progress(&self.tasks)
    }

    pub fn all_done(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|t| t.status == TaskStatus::Done)
    }
}

/// Rounded percentage of Done tasks. An empty roster is 0%.
pub fn progress(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    let done = tasks.iter().filter(|t| t.status == TaskStatus::Done).count();
    ((done as f64 * 100.0) / tasks.len() as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_roster_starts_at_quarter_progress() {
        let board = TaskBoard::seeded();
        assert_eq!(board.tasks().len(), 4);
        assert_eq!(board.progress(), 25);
        assert!(!board.all_done());
        assert_eq!(
            board.task_for_action(AiAction::StatementOfPurpose).map(|t| t.id.as_str()),
            Some("1")
        );
    }

    #[test]
    fn progress_rounds_done_share() {
        let tasks = vec![
            Task::new("a", "a", TaskStatus::Done, ""),
            Task::new("b", "b", TaskStatus::Done, ""),
            Task::new("c", "c", TaskStatus::Todo, ""),
            Task::new("d", "d", TaskStatus::Todo, ""),
        ];
        assert_eq!(progress(&tasks), 50);

        let thirds = vec![
            Task::new("a", "a", TaskStatus::Done, ""),
            Task::new("b", "b", TaskStatus::Done, ""),
            Task::new("c", "c", TaskStatus::InProgress, ""),
        ];
        assert_eq!(progress(&thirds), 67);
        assert_eq!(progress(&[]), 0);
    }

    #[test]
    fn any_transition_is_allowed_including_undo() {
        let mut board = TaskBoard::seeded();
        assert!(board.set_status("3", TaskStatus::Todo));
        assert_eq!(board.get("3").map(|t| t.status), Some(TaskStatus::Todo));
        assert!(board.set_status("1", TaskStatus::Done));
        assert!(board.set_status("1", TaskStatus::InProgress));
        assert_eq!(board.get("1").map(|t| t.status), Some(TaskStatus::InProgress));
    }

    #[test]
    fn unknown_task_is_a_no_op() {
        let mut board = TaskBoard::seeded();
        let before = board.clone();
        assert!(!board.set_status("99", TaskStatus::Done));
        assert_eq!(board, before);
    }

    #[test]
    fn all_done_requires_every_task() {
        let mut board = TaskBoard::seeded();
        for id in ["1", "2", "3"] {
            board.set_status(id, TaskStatus::Done);
        }
        assert!(!board.all_done());
        board.set_status(APPLICATION_FEE_TASK, TaskStatus::Done);
        assert!(board.all_done());
        assert_eq!(board.progress(), 100);
        assert!(!TaskBoard::from_tasks(Vec::new()).all_done());
    }
}
