pub mod approval;
pub mod daily;
pub mod entry;
pub mod pause;
pub mod product;
pub mod session;

pub use approval::{
    ApprovalAction, ApprovalState, ApprovalStatus, ApproveRequest, RejectRequest, Signoff,
};
pub use daily::{
    CreateProductionEntryRequest, DailyLog, DailyLogDetail, DailyLogListQuery, DayView,
    DayViewQuery, ProductionEntry, SubmitDailyLogRequest,
};
pub use entry::{
    CorrectEntryRequest, EntryKind, GlueEvent, GlueRequest, LoadRequest, PressEntry,
    UnloadRequest,
};
pub use pause::{PauseEvent, PauseKind};
pub use product::{CreateStockRecordRequest, ProductKey, StockListQuery, StockRecord};
pub use session::{
    EntryReport, OperatorBoard, PauseRequest, PressSession, ProductTotal, SelectProductRequest,
    SessionDetail, SessionHistoryQuery, SessionReport, SessionStatus, SetDaylightsRequest,
    StartSessionRequest,
};
