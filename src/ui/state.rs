//! App 状态定义 (Model)
//!
//! 包含应用状态结构体及相关枚举

use chrono::{Duration, Local, NaiveDate};

use super::form::AppointmentForm;
use crate::config::Config;
use crate::error::Result;
use crate::models::{Appointment, TimeRange};
use crate::schedule::Schedule;

/// 应用状态
pub struct App {
    pub schedule: Schedule,
    pub physician_index: usize,
    pub current_date: NaiveDate,
    pub selected_index: usize,
    pub display_list: Vec<String>, // 当前医生的预约编码，按表格顺序
    pub mode: AppMode,
    pub form: AppointmentForm,
    pub message: Option<String>,
    pub placeholder_rows: usize,
    pub default_duration_minutes: u32,
    pub working_hours: TimeRange,
}

/// 应用模式
#[derive(Debug, Clone, PartialEq)]
pub enum AppMode {
    Normal,
    Booking,
    Modifying(String), // 正在修改的预约编码
    Confirm(ConfirmAction),
}

/// 确认操作类型
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmAction {
    CancelAppointment(String),
}

/// 右侧三个切换按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Book,
    Modify,
    Cancel,
}

impl Toggle {
    pub const ALL: [Toggle; 3] = [Toggle::Book, Toggle::Modify, Toggle::Cancel];

    pub fn label(&self) -> &'static str {
        match self {
            Toggle::Book => "Marcar Consulta",
            Toggle::Modify => "Alterar Consulta",
            Toggle::Cancel => "Desmarcar Consulta",
        }
    }

    pub fn key(&self) -> char {
        match self {
            Toggle::Book => 'b',
            Toggle::Modify => 'e',
            Toggle::Cancel => 'd',
        }
    }
}

impl AppMode {
    /// 当前处于按下状态的按钮
    pub fn active_toggle(&self) -> Option<Toggle> {
        match self {
            AppMode::Normal => None,
            AppMode::Booking => Some(Toggle::Book),
            AppMode::Modifying(_) => Some(Toggle::Modify),
            AppMode::Confirm(ConfirmAction::CancelAppointment(_)) => Some(Toggle::Cancel),
        }
    }
}

impl App {
    /// 创建新的应用实例
    pub fn new(schedule: Schedule, config: &Config) -> Result<Self> {
        let mut app = Self {
            schedule,
            physician_index: 0,
            current_date: Local::now().date_naive(),
            selected_index: 0,
            display_list: Vec::new(),
            mode: AppMode::Normal,
            form: AppointmentForm::default(),
            message: None,
            placeholder_rows: config.placeholder_rows,
            default_duration_minutes: config.default_duration_minutes,
            working_hours: config.working_hours()?,
        };
        app.refresh_display_list();
        Ok(app)
    }

    pub fn current_physician(&self) -> Option<&str> {
        self.schedule
            .physicians()
            .get(self.physician_index)
            .map(String::as_str)
    }

    /// 刷新显示列表
    pub fn refresh_display_list(&mut self) {
        self.display_list = match self.current_physician() {
            Some(physician) => self
                .schedule
                .appointments_for(physician, self.current_date)
                .iter()
                .map(|a| a.code().to_string())
                .collect(),
            None => Vec::new(),
        };

        // 确保选中索引有效
        if self.display_list.is_empty() {
            self.selected_index = 0;
        } else if self.selected_index >= self.display_list.len() {
            self.selected_index = self.display_list.len() - 1;
        }
    }

    /// 获取当前选中的预约
    pub fn selected_appointment(&self) -> Option<&Appointment> {
        let physician = self.current_physician()?;
        self.display_list
            .get(self.selected_index)
            .and_then(|code| self.schedule.get(physician, code))
    }

    pub fn selected_code(&self) -> Option<String> {
        self.display_list.get(self.selected_index).cloned()
    }

    /// 当前医生当天的空闲时段
    pub fn free_slots(&self) -> Vec<TimeRange> {
        let step = Duration::minutes(i64::from(self.default_duration_minutes));
        self.current_physician()
            .and_then(|physician| {
                self.schedule
                    .free_slots(physician, self.current_date, self.working_hours, step)
                    .ok()
            })
            .unwrap_or_default()
    }

    /// 表格单元格，不足 placeholder_rows 时补空行
    pub fn table_cells(&self) -> Vec<[String; 2]> {
        let mut cells: Vec<[String; 2]> = match self.current_physician() {
            Some(physician) => self
                .display_list
                .iter()
                .filter_map(|code| self.schedule.get(physician, code))
                .map(|a| [a.slot_label(), a.patient.clone()])
                .collect(),
            None => Vec::new(),
        };
        while cells.len() < self.placeholder_rows {
            cells.push([String::new(), String::new()]);
        }
        cells
    }
}
