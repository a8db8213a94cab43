use crate::{event::Emitter, task::Task};

#[derive(Debug)]
pub enum Action {
    Quit,
    SkipRender,
    Task(Task),
}

#[derive(Debug, Eq, PartialEq)]
pub enum ActionResult {
    Normal,
    Quit,
    SkipRender,
}

pub fn exec(emitter: &mut Emitter, actions: Vec<Action>) -> ActionResult {
    let mut result = ActionResult::Normal;
    for action in actions {
        match action {
            Action::Quit => return ActionResult::Quit,
            Action::SkipRender => {
                if result == ActionResult::Normal {
                    result = ActionResult::SkipRender;
                }
            }
            Action::Task(task) => emitter.run(task),
        }
    }

    result
}
