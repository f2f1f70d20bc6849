//! 键盘事件映射 (Input -> Action)
//!
//! 将按键事件转换为 Action

use crossterm::event::KeyCode;

use super::actions::Action;
use super::state::{App, AppMode};

/// 根据当前模式和按键获取对应的 Action
pub fn get_action(mode: &AppMode, key: KeyCode) -> Option<Action> {
    match mode {
        AppMode::Normal => match key {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Back),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::MoveSelectionDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::MoveSelectionUp),
            KeyCode::Char('h') | KeyCode::Left => Some(Action::PreviousPhysician),
            KeyCode::Char('l') | KeyCode::Right => Some(Action::NextPhysician),
            KeyCode::Char('[') => Some(Action::PreviousDay),
            KeyCode::Char(']') => Some(Action::NextDay),
            KeyCode::Char('t') => Some(Action::Today),
            KeyCode::Char('s') => Some(Action::AdvanceStatus),
            KeyCode::Char('b') => Some(Action::ToggleBook),
            KeyCode::Char('e') => Some(Action::ToggleModify),
            KeyCode::Char('d') => Some(Action::ToggleCancel),
            _ => None,
        },
        AppMode::Booking | AppMode::Modifying(_) => match key {
            KeyCode::Esc => Some(Action::Dismiss),
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Tab => Some(Action::NextField),
            KeyCode::BackTab => Some(Action::PreviousField),
            KeyCode::Backspace => Some(Action::DeleteChar),
            KeyCode::Char(c) => Some(Action::Input(c)),
            _ => None,
        },
        AppMode::Confirm(_) => match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::Submit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Action::Dismiss),
            _ => None,
        },
    }
}

/// 处理按键事件，返回 true 表示关闭窗口
pub fn handle_key_event(app: &mut App, key: KeyCode) -> bool {
    match get_action(&app.mode, key) {
        Some(action) => app.dispatch(action),
        None => false,
    }
}
