//! Action 枚举定义 (Intent)
//!
//! 用户交互转化为明确的语义化 Action

/// 用户操作枚举
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// 返回（Voltar），关闭窗口
    Back,
    MoveSelectionUp,
    MoveSelectionDown,
    PreviousPhysician,
    NextPhysician,
    PreviousDay,
    NextDay,
    Today,
    AdvanceStatus,

    // 三个切换按钮
    ToggleBook,
    ToggleModify,
    ToggleCancel,

    // 表单/通用交互
    Dismiss,       // Esc / n
    Submit,        // Enter / y
    NextField,     // Tab
    PreviousField, // Shift+Tab
    Input(char),
    DeleteChar,
}
