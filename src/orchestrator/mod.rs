//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量作文处理器
//! - 启动校验（密钥、提示词、评分表、作文目录）
//! - 批量加载作文
//! - 控制并发数量（Semaphore）
//! - 所有组合结束后写出结果文档
//! - 输出全局统计信息
//!
//! ### `essay_processor` - 单篇作文处理器
//! - 为五个维度各启动一个评分任务
//! - 汇总单篇作文的结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Essay>)
//!     ↓
//! essay_processor (处理 5 个维度)
//!     ↓
//! workflow::GradingFlow (处理单个 (作文, 维度) 组合)
//!     ↓
//! services (能力层：prompt / llm / parse / write)
//! ```

pub mod batch_processor;
pub mod essay_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use essay_processor::{grade_essay, EssayResult};
