//! 业务逻辑处理 (Update/Dispatch)
//!
//! 包含核心的 dispatch 逻辑和各种业务处理方法

use chrono::{Duration, Local, NaiveDate};
use tracing::{debug, error, warn};

use super::actions::Action;
use super::form::{AppointmentForm, FormField};
use super::state::{App, AppMode, ConfirmAction};
use crate::error::AgendaError;
use crate::models::suggest_code;
use crate::schedule::AppointmentChanges;

impl App {
    /// 核心逻辑分发，返回 true 表示关闭窗口
    pub fn dispatch(&mut self, action: Action) -> bool {
        match action {
            Action::Back => return true,
            Action::MoveSelectionUp => self.move_up(),
            Action::MoveSelectionDown => self.move_down(),
            Action::PreviousPhysician => self.select_physician(-1),
            Action::NextPhysician => self.select_physician(1),
            Action::PreviousDay => self.shift_day(-1),
            Action::NextDay => self.shift_day(1),
            Action::Today => self.go_to_date(Local::now().date_naive()),
            Action::AdvanceStatus => self.advance_status(),

            Action::ToggleBook => self.start_booking(),
            Action::ToggleModify => self.start_modify(),
            Action::ToggleCancel => self.start_cancel(),

            Action::Dismiss => self.dismiss(),

            Action::Submit => match &self.mode {
                AppMode::Booking | AppMode::Modifying(_) => self.submit_form(),
                AppMode::Confirm(_) => self.execute_confirm(),
                AppMode::Normal => {}
            },

            Action::NextField => {
                if self.in_form() {
                    self.leave_field();
                    self.form.next_field();
                }
            }
            Action::PreviousField => {
                if self.in_form() {
                    self.form.previous_field();
                }
            }

            Action::Input(c) => {
                if self.in_form() {
                    self.form.push_char(c);
                }
            }

            Action::DeleteChar => {
                if self.in_form() {
                    self.form.pop_char();
                }
            }
        }
        false
    }

    fn in_form(&self) -> bool {
        matches!(self.mode, AppMode::Booking | AppMode::Modifying(_))
    }

    // ============ 导航相关 ============

    /// 向上移动选择
    pub fn move_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    /// 向下移动选择
    pub fn move_down(&mut self) {
        if self.selected_index + 1 < self.display_list.len() {
            self.selected_index += 1;
        }
    }

    /// 切换医生（循环），表格随之过滤
    pub fn select_physician(&mut self, step: isize) {
        let count = self.schedule.physicians().len();
        if count == 0 {
            return;
        }
        let next = (self.physician_index as isize + step).rem_euclid(count as isize);
        self.physician_index = next as usize;
        self.selected_index = 0;
        self.message = None;
        self.refresh_display_list();
    }

    /// 前后翻天
    pub fn shift_day(&mut self, days: i64) {
        if let Some(date) = self.current_date.checked_add_signed(Duration::days(days)) {
            self.go_to_date(date);
        }
    }

    pub fn go_to_date(&mut self, date: NaiveDate) {
        self.current_date = date;
        self.selected_index = 0;
        self.message = None;
        self.refresh_display_list();
    }

    // ============ 状态 ============

    /// 推进选中预约的状态
    pub fn advance_status(&mut self) {
        let (Some(physician), Some(code)) = (
            self.current_physician().map(str::to_string),
            self.selected_code(),
        ) else {
            self.message = Some("Selecione uma consulta".to_string());
            return;
        };
        match self.schedule.advance_status(&physician, &code) {
            Ok(status) => {
                self.message = Some(format!("Consulta {} {}", code, status.label()));
            }
            Err(err) => self.report(err),
        }
    }

    // ============ 预约 ============

    /// 开始新预约
    pub fn start_booking(&mut self) {
        if self.current_physician().is_none() {
            self.message = Some("Nenhum médico selecionado".to_string());
            return;
        }
        self.form = AppointmentForm::for_booking(suggest_code());
        // 预填当天第一个空闲时段
        if let Some(slot) = self.free_slots().first() {
            self.form.fill_slot(*slot);
        }
        self.mode = AppMode::Booking;
        self.message = None;
    }

    // ============ 修改 ============

    /// 开始修改选中的预约
    pub fn start_modify(&mut self) {
        match self.selected_appointment() {
            Some(appointment) => {
                let code = appointment.code().to_string();
                self.form = AppointmentForm::for_modify(appointment);
                self.mode = AppMode::Modifying(code);
                self.message = None;
            }
            None => self.message = Some("Selecione uma consulta para alterar".to_string()),
        }
    }

    // ============ 取消 ============

    /// 开始取消选中的预约
    pub fn start_cancel(&mut self) {
        match self.selected_code() {
            Some(code) => self.mode = AppMode::Confirm(ConfirmAction::CancelAppointment(code)),
            None => self.message = Some("Selecione uma consulta para desmarcar".to_string()),
        }
    }

    /// 执行确认操作
    pub fn execute_confirm(&mut self) {
        let AppMode::Confirm(ConfirmAction::CancelAppointment(code)) = &self.mode else {
            return;
        };
        let code = code.clone();
        let Some(physician) = self.current_physician().map(str::to_string) else {
            self.mode = AppMode::Normal;
            return;
        };
        match self.schedule.cancel(&physician, &code) {
            Ok(removed) => {
                self.message = Some(format!(
                    "Consulta {} de {} desmarcada",
                    removed.code(),
                    removed.patient
                ));
            }
            Err(err) => self.report(err),
        }
        self.refresh_display_list();
        self.mode = AppMode::Normal;
    }

    // ============ 表单 ============

    /// 离开当前字段时的处理
    fn leave_field(&mut self) {
        if self.form.focused() == FormField::Start {
            self.form.fill_end_from_start(self.default_duration_minutes);
        }
    }

    /// Enter：不是最后一个字段就前进，否则提交
    fn submit_form(&mut self) {
        if !self.form.is_last_field() {
            self.leave_field();
            self.form.next_field();
            return;
        }
        let Some(physician) = self.current_physician().map(str::to_string) else {
            return;
        };

        let date = self.current_date;
        let result = match &self.mode {
            AppMode::Booking => self
                .form
                .to_appointment(date)
                .and_then(|appointment| self.schedule.book(&physician, appointment))
                .map(|_| format!("Consulta {} marcada", self.form.code.trim())),
            AppMode::Modifying(code) => {
                let code = code.clone();
                self.form
                    .kind()
                    .and_then(|kind| Ok((kind, self.form.parsed_visit_type()?)))
                    .and_then(|(kind, visit_type)| {
                        let changes = AppointmentChanges {
                            kind,
                            visit_type,
                            medical_description: self.form.description.trim().to_string(),
                        };
                        self.schedule.modify(&physician, &code, changes)
                    })
                    .map(|_| format!("Consulta {} alterada", code))
            }
            _ => return,
        };

        match result {
            Ok(message) => {
                let code = self.form.code.trim().to_string();
                self.refresh_display_list();
                if let Some(index) = self.display_list.iter().position(|c| *c == code) {
                    self.selected_index = index;
                }
                self.mode = AppMode::Normal;
                self.message = Some(message);
            }
            // 保持表单打开，等待重新输入
            Err(err) => self.report(err),
        }
    }

    fn report(&mut self, err: AgendaError) {
        if err.is_recoverable() {
            warn!(error = %err, "operação rejeitada");
        } else {
            error!(error = %err, "falha inesperada");
        }
        self.message = Some(err.to_string());
    }

    // ============ 通用操作 ============

    /// 取消当前操作（按钮弹起）
    pub fn dismiss(&mut self) {
        debug!(mode = ?self.mode, "ação descartada");
        self.mode = AppMode::Normal;
        self.message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{Appointment, Consultation, Status, VisitType};
    use crate::schedule::Schedule;

    const DRA: &str = "Dra. Helena";
    const DR: &str = "Dr. Paulo";

    fn app() -> App {
        let config = Config::default();
        let mut app = App::new(Schedule::new(vec![DRA.to_string(), DR.to_string()]), &config).unwrap();
        app.go_to_date(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        app
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.dispatch(Action::Input(c));
        }
    }

    fn clear_field(app: &mut App) {
        for _ in 0..16 {
            app.dispatch(Action::DeleteChar);
        }
    }

    /// 通过表单预约一条
    fn book(app: &mut App, code: &str, patient: &str, start: &str, end: &str) {
        app.dispatch(Action::ToggleBook);
        clear_field(app);
        type_text(app, code);
        app.dispatch(Action::Submit);
        type_text(app, patient);
        app.dispatch(Action::Submit);
        clear_field(app);
        type_text(app, start);
        app.dispatch(Action::Submit);
        clear_field(app);
        type_text(app, end);
        app.dispatch(Action::Submit);
        app.dispatch(Action::Submit);
        app.dispatch(Action::Submit);
    }

    #[test]
    fn test_back_closes() {
        let mut app = app();
        assert!(app.dispatch(Action::Back));
    }

    #[test]
    fn test_toggles_without_rows_do_not_change_state() {
        let mut app = app();
        assert!(!app.dispatch(Action::ToggleModify));
        assert_eq!(app.mode, AppMode::Normal);
        assert!(!app.dispatch(Action::ToggleCancel));
        assert_eq!(app.mode, AppMode::Normal);
        assert!(!app.dispatch(Action::AdvanceStatus));
        assert!(app.message.is_some());

        assert!(!app.dispatch(Action::ToggleBook));
        assert_eq!(app.mode, AppMode::Booking);
        app.dispatch(Action::Dismiss);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.display_list.is_empty());
    }

    #[test]
    fn test_book_through_form() {
        let mut app = app();
        book(&mut app, "C001", "Ana", "09:00", "09:30");
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.display_list, vec!["C001".to_string()]);
        let row = app.selected_appointment().unwrap();
        assert_eq!(row.patient, "Ana");
        assert_eq!(row.date, app.current_date);
        assert_eq!(row.slot_label(), "09:00–09:30 · C001");
    }

    #[test]
    fn test_booking_prefills_first_free_slot() {
        let mut app = app();
        book(&mut app, "C001", "Ana", "08:00", "08:30");
        app.dispatch(Action::ToggleBook);
        assert_eq!(app.form.start, "08:30");
        assert_eq!(app.form.end, "09:00");
    }

    #[test]
    fn test_end_time_defaults_from_duration() {
        let mut app = app();
        app.dispatch(Action::ToggleBook);
        app.form.end.clear();
        app.dispatch(Action::Submit);
        type_text(&mut app, "Ana");
        app.dispatch(Action::Submit);
        clear_field(&mut app);
        type_text(&mut app, "14:00");
        app.dispatch(Action::Submit);
        assert_eq!(app.form.end, "14:30");
    }

    #[test]
    fn test_missing_end_is_named() {
        let mut app = app();
        book(&mut app, "C001", "Ana", "09:00", "");
        assert_eq!(app.mode, AppMode::Booking);
        assert!(app.message.as_deref().unwrap().contains("horário de fim"));
    }

    #[test]
    fn test_conflict_keeps_form_open() {
        let mut app = app();
        book(&mut app, "C001", "Ana", "09:00", "09:30");
        book(&mut app, "C002", "Bia", "09:15", "09:45");
        assert_eq!(app.mode, AppMode::Booking);
        assert!(app.message.as_deref().unwrap().contains("C001"));
        app.dispatch(Action::Dismiss);
        assert_eq!(app.display_list.len(), 1);
    }

    #[test]
    fn test_day_selector_scopes_table_and_conflicts() {
        let mut app = app();
        book(&mut app, "C001", "Ana", "09:00", "09:30");
        app.dispatch(Action::NextDay);
        assert!(app.display_list.is_empty());
        book(&mut app, "C002", "Bia", "09:00", "09:30");
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.display_list, vec!["C002".to_string()]);

        app.dispatch(Action::PreviousDay);
        assert_eq!(app.display_list, vec!["C001".to_string()]);
    }

    #[test]
    fn test_free_slots_follow_bookings() {
        let mut app = app();
        assert_eq!(app.free_slots().len(), 20);
        book(&mut app, "C001", "Ana", "09:00", "10:00");
        assert_eq!(app.free_slots().len(), 18);
        app.dispatch(Action::NextDay);
        assert_eq!(app.free_slots().len(), 20);
    }

    #[test]
    fn test_physician_selector_filters() {
        let mut app = app();
        book(&mut app, "C001", "Ana", "09:00", "09:30");
        app.dispatch(Action::NextPhysician);
        assert_eq!(app.current_physician(), Some(DR));
        assert!(app.display_list.is_empty());
        app.dispatch(Action::NextPhysician);
        assert_eq!(app.current_physician(), Some(DRA));
        app.dispatch(Action::PreviousPhysician);
        assert_eq!(app.current_physician(), Some(DR));
    }

    #[test]
    fn test_modify_selected_row() {
        let mut app = app();
        let date = app.current_date;
        app.schedule
            .book(
                DRA,
                Appointment::new(
                    Consultation::scheduled_from_str("C001", "09:00", "09:30").unwrap(),
                    "Ana",
                    date,
                ),
            )
            .unwrap();
        app.refresh_display_list();

        app.dispatch(Action::ToggleModify);
        assert_eq!(app.mode, AppMode::Modifying("C001".to_string()));
        clear_field(&mut app);
        type_text(&mut app, "10:00");
        app.dispatch(Action::Submit);
        clear_field(&mut app);
        type_text(&mut app, "10:20");
        app.dispatch(Action::Submit);
        clear_field(&mut app);
        type_text(&mut app, "retorno");
        app.dispatch(Action::Submit);
        type_text(&mut app, "Retorno");
        app.dispatch(Action::Submit);

        assert_eq!(app.mode, AppMode::Normal);
        let row = app.selected_appointment().unwrap();
        assert_eq!(row.slot_label(), "10:00–10:20 · C001");
        assert_eq!(row.visit_type, VisitType::Retorno);
        assert_eq!(row.consultation.medical_description(), "Retorno");
    }

    #[test]
    fn test_advance_status_of_selected_row() {
        let mut app = app();
        book(&mut app, "C001", "Ana", "09:00", "09:30");
        app.dispatch(Action::AdvanceStatus);
        assert_eq!(app.selected_appointment().unwrap().status, Status::Confirmada);
        app.dispatch(Action::AdvanceStatus);
        app.dispatch(Action::AdvanceStatus);
        assert_eq!(app.selected_appointment().unwrap().status, Status::Finalizada);
        assert_eq!(app.message.as_deref(), Some("Consulta C001 finalizada"));

        app.dispatch(Action::AdvanceStatus);
        assert_eq!(app.selected_appointment().unwrap().status, Status::Finalizada);
        assert_ne!(app.message.as_deref(), Some("Consulta C001 finalizada"));
    }

    #[test]
    fn test_cancel_with_confirmation() {
        let mut app = app();
        book(&mut app, "C001", "Ana", "09:00", "09:30");

        app.dispatch(Action::ToggleCancel);
        app.dispatch(Action::Dismiss);
        assert_eq!(app.display_list.len(), 1);

        app.dispatch(Action::ToggleCancel);
        assert!(matches!(app.mode, AppMode::Confirm(_)));
        app.dispatch(Action::Submit);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.display_list.is_empty());
    }

    #[test]
    fn test_table_is_padded() {
        let mut app = app();
        assert_eq!(app.table_cells().len(), 4);
        assert!(app.table_cells().iter().all(|row| row[0].is_empty()));
        book(&mut app, "C001", "Ana", "09:00", "09:30");
        let cells = app.table_cells();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0][1], "Ana");
    }
}
