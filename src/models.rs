use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::error::{AgendaError, Result};

/// 解析 `HH:MM` 或 `HH:MM:SS`
pub fn parse_time(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| AgendaError::InvalidTime(raw.to_string()))
}

/// 预约时间段，始终满足 start < end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(AgendaError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_time(start)?, parse_time(end)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// 半开区间比较：首尾相接不算重叠
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// 按固定步长切分，最后不足一个步长的部分丢弃
    pub fn slots(&self, step: Duration) -> Vec<TimeRange> {
        let mut slots = Vec::new();
        if step <= Duration::zero() {
            return slots;
        }
        let mut current = self.start;
        loop {
            let (next, wrapped) = current.overflowing_add_signed(step);
            if wrapped != 0 || next > self.end {
                break;
            }
            slots.push(TimeRange {
                start: current,
                end: next,
            });
            current = next;
        }
        slots
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}–{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// 咨询类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsultationKind {
    /// 已预约（Marcada），带时间段
    Scheduled(TimeRange),
    /// 随到随诊（avulsa）
    OnDemand,
}

/// 咨询记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consultation {
    code: String,
    medical_description: String,
    kind: ConsultationKind,
}

impl Consultation {
    pub fn scheduled(code: impl Into<String>, start: NaiveTime, end: NaiveTime) -> Result<Self> {
        Ok(Self {
            code: code.into(),
            medical_description: String::new(),
            kind: ConsultationKind::Scheduled(TimeRange::new(start, end)?),
        })
    }

    pub fn scheduled_from_str(code: impl Into<String>, start: &str, end: &str) -> Result<Self> {
        let range = TimeRange::parse(start, end)?;
        Self::scheduled(code, range.start(), range.end())
    }

    pub fn on_demand(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            medical_description: String::new(),
            kind: ConsultationKind::OnDemand,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
    }

    pub fn medical_description(&self) -> &str {
        &self.medical_description
    }

    pub fn set_medical_description(&mut self, description: impl Into<String>) {
        self.medical_description = description.into();
    }

    pub fn kind(&self) -> ConsultationKind {
        self.kind
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        match self.kind {
            ConsultationKind::Scheduled(range) => Some(range),
            ConsultationKind::OnDemand => None,
        }
    }

    #[allow(dead_code)]
    pub fn is_scheduled(&self) -> bool {
        matches!(self.kind, ConsultationKind::Scheduled(_))
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        self.time_range().map(|r| r.start())
    }

    pub fn end_time(&self) -> Option<NaiveTime> {
        self.time_range().map(|r| r.end())
    }

    /// 修改开始时间；破坏 start < end 时保持原值并返回错误
    #[allow(dead_code)]
    pub fn set_start_time(&mut self, start: NaiveTime) -> Result<()> {
        let range = self.require_range()?;
        self.kind = ConsultationKind::Scheduled(TimeRange::new(start, range.end())?);
        Ok(())
    }

    #[allow(dead_code)]
    pub fn set_end_time(&mut self, end: NaiveTime) -> Result<()> {
        let range = self.require_range()?;
        self.kind = ConsultationKind::Scheduled(TimeRange::new(range.start(), end)?);
        Ok(())
    }

    /// 整体替换类型（修改预约时使用）
    pub fn set_kind(&mut self, kind: ConsultationKind) {
        self.kind = kind;
    }

    fn require_range(&self) -> Result<TimeRange> {
        self.time_range()
            .ok_or_else(|| AgendaError::NotScheduled(self.code.clone()))
    }
}

/// 咨询类型（TipoConsulta）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitType {
    #[default]
    Normal,
    Retorno,
    Emergencia,
    Exame,
}

impl VisitType {
    pub fn label(&self) -> &'static str {
        match self {
            VisitType::Normal => "normal",
            VisitType::Retorno => "retorno",
            VisitType::Emergencia => "emergência",
            VisitType::Exame => "exame",
        }
    }
}

impl FromStr for VisitType {
    type Err = AgendaError;

    /// 空字符串视为普通咨询
    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "normal" => Ok(VisitType::Normal),
            "retorno" => Ok(VisitType::Retorno),
            "emergencia" | "emergência" => Ok(VisitType::Emergencia),
            "exame" => Ok(VisitType::Exame),
            other => Err(AgendaError::InvalidVisitType(other.to_string())),
        }
    }
}

/// 预约状态，只能向前推进；取消直接删除，不保留状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Agendada,
    Confirmada,
    EmAndamento,
    Finalizada,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Agendada => "agendada",
            Status::Confirmada => "confirmada",
            Status::EmAndamento => "em andamento",
            Status::Finalizada => "finalizada",
        }
    }

    pub fn next(&self) -> Option<Status> {
        match self {
            Status::Agendada => Some(Status::Confirmada),
            Status::Confirmada => Some(Status::EmAndamento),
            Status::EmAndamento => Some(Status::Finalizada),
            Status::Finalizada => None,
        }
    }
}

/// 表格中的一行：咨询 + 患者 + 日期
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appointment {
    pub consultation: Consultation,
    pub patient: String,
    pub date: NaiveDate,
    pub visit_type: VisitType,
    pub status: Status,
}

impl Appointment {
    pub fn new(consultation: Consultation, patient: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            consultation,
            patient: patient.into(),
            date,
            visit_type: VisitType::Normal,
            status: Status::Agendada,
        }
    }

    pub fn with_visit_type(mut self, visit_type: VisitType) -> Self {
        self.visit_type = visit_type;
        self
    }

    pub fn code(&self) -> &str {
        self.consultation.code()
    }

    /// "Horário/Consulta" 列的文本
    pub fn slot_label(&self) -> String {
        match self.consultation.time_range() {
            Some(range) => format!("{} · {}", range, self.code()),
            None => format!("avulsa · {}", self.code()),
        }
    }
}

/// 生成新预约的建议编码
pub fn suggest_code() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("C{}", id[..6].to_uppercase())
}
