use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::error::{AgendaError, Result};
use crate::models::{Appointment, ConsultationKind, Status, TimeRange, VisitType};

/// 修改预约时允许变更的字段（日期和患者不变）
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentChanges {
    pub kind: ConsultationKind,
    pub visit_type: VisitType,
    pub medical_description: String,
}

/// 运行时预约表：医生 -> 预约列表
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    physicians: Vec<String>,
    appointments: HashMap<String, Vec<Appointment>>,
}

impl Schedule {
    /// 重复的医生名只保留第一个
    pub fn new(physicians: Vec<String>) -> Self {
        let mut schedule = Self::default();
        for name in physicians {
            if schedule.appointments.contains_key(&name) {
                continue;
            }
            schedule.appointments.insert(name.clone(), Vec::new());
            schedule.physicians.push(name);
        }
        schedule
    }

    pub fn physicians(&self) -> &[String] {
        &self.physicians
    }

    /// 某医生某天的预约：有时间段的按开始时间排序，随诊的排在后面
    pub fn appointments_for(&self, physician: &str, date: NaiveDate) -> Vec<&Appointment> {
        let mut rows: Vec<&Appointment> = self
            .appointments
            .get(physician)
            .map(|list| list.iter().filter(|a| a.date == date).collect())
            .unwrap_or_default();
        // 稳定排序，随诊之间保持插入顺序
        rows.sort_by_key(|a| match a.consultation.start_time() {
            Some(start) => (0, Some(start)),
            None => (1, None),
        });
        rows
    }

    pub fn get(&self, physician: &str, code: &str) -> Option<&Appointment> {
        self.appointments
            .get(physician)
            .and_then(|list| list.iter().find(|a| a.code() == code))
    }

    /// 预约（Marcar Consulta）
    pub fn book(&mut self, physician: &str, mut appointment: Appointment) -> Result<()> {
        let code = appointment.code().trim().to_string();
        if code.is_empty() {
            return Err(AgendaError::MissingCode);
        }
        let patient = appointment.patient.trim().to_string();
        if patient.is_empty() {
            return Err(AgendaError::MissingPatient);
        }
        appointment.consultation.set_code(code.clone());
        appointment.patient = patient;

        let list = self.list(physician)?;
        if list.iter().any(|a| a.code() == code) {
            return Err(AgendaError::DuplicateCode(code));
        }
        check_conflict(
            list,
            &code,
            appointment.date,
            appointment.consultation.kind(),
            None,
        )?;

        info!(physician, code = %code, date = %appointment.date, "consulta marcada");
        self.list_mut(physician)?.push(appointment);
        Ok(())
    }

    /// 修改（Alterar Consulta）：替换时间段、类型与描述
    pub fn modify(&mut self, physician: &str, code: &str, changes: AppointmentChanges) -> Result<()> {
        let list = self.list(physician)?;
        let date = list
            .iter()
            .find(|a| a.code() == code)
            .map(|a| a.date)
            .ok_or_else(|| AgendaError::NotFound(code.to_string()))?;
        check_conflict(list, code, date, changes.kind, Some(code))?;

        let list = self.list_mut(physician)?;
        if let Some(appointment) = list.iter_mut().find(|a| a.code() == code) {
            appointment.consultation.set_kind(changes.kind);
            appointment
                .consultation
                .set_medical_description(changes.medical_description);
            appointment.visit_type = changes.visit_type;
        }
        info!(physician, code, "consulta alterada");
        Ok(())
    }

    /// 取消（Desmarcar Consulta），返回被删除的预约
    pub fn cancel(&mut self, physician: &str, code: &str) -> Result<Appointment> {
        let list = self.list_mut(physician)?;
        let index = list
            .iter()
            .position(|a| a.code() == code)
            .ok_or_else(|| AgendaError::NotFound(code.to_string()))?;
        let removed = list.remove(index);
        info!(physician, code, "consulta desmarcada");
        Ok(removed)
    }

    /// 推进状态：agendada → confirmada → em andamento → finalizada
    pub fn advance_status(&mut self, physician: &str, code: &str) -> Result<Status> {
        let appointment = self
            .list_mut(physician)?
            .iter_mut()
            .find(|a| a.code() == code)
            .ok_or_else(|| AgendaError::NotFound(code.to_string()))?;
        let next = appointment
            .status
            .next()
            .ok_or_else(|| AgendaError::AlreadyFinished(code.to_string()))?;
        appointment.status = next;
        info!(physician, code, status = next.label(), "status alterado");
        Ok(next)
    }

    /// 某天的空闲时段：在 `window` 内按 `step` 切分，跳过与已有预约重叠的
    pub fn free_slots(
        &self,
        physician: &str,
        date: NaiveDate,
        window: TimeRange,
        step: Duration,
    ) -> Result<Vec<TimeRange>> {
        let booked: Vec<TimeRange> = self
            .list(physician)?
            .iter()
            .filter(|a| a.date == date)
            .filter_map(|a| a.consultation.time_range())
            .collect();
        Ok(window
            .slots(step)
            .into_iter()
            .filter(|slot| !booked.iter().any(|b| b.overlaps(slot)))
            .collect())
    }

    fn list(&self, physician: &str) -> Result<&Vec<Appointment>> {
        self.appointments
            .get(physician)
            .ok_or_else(|| AgendaError::UnknownPhysician(physician.to_string()))
    }

    fn list_mut(&mut self, physician: &str) -> Result<&mut Vec<Appointment>> {
        self.appointments
            .get_mut(physician)
            .ok_or_else(|| AgendaError::UnknownPhysician(physician.to_string()))
    }
}

/// 检查同一医生同一天的时间段冲突，`skip` 为正在修改的那一条
fn check_conflict(
    list: &[Appointment],
    code: &str,
    date: NaiveDate,
    kind: ConsultationKind,
    skip: Option<&str>,
) -> Result<()> {
    let ConsultationKind::Scheduled(range) = kind else {
        return Ok(());
    };
    for other in list.iter().filter(|a| a.date == date) {
        if Some(other.code()) == skip {
            continue;
        }
        if let Some(existing) = other.consultation.time_range() {
            if range.overlaps(&existing) {
                debug!(code, existing = other.code(), "conflito de horário");
                return Err(AgendaError::Conflict {
                    code: code.to_string(),
                    existing: other.code().to_string(),
                });
            }
        }
    }
    Ok(())
}
