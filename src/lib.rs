//! # Corretor de Redação
//!
//! 一个调用 LLM 为 ENEM 作文按五个维度评分的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 模型层（Models）
//! - `models/` - 作文、评分维度、评分表、结果文档
//! - `loaders/` - 读取作文目录、提示词模板和评分表
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个请求
//! - `ChatModel` / `LlmService` - LLM 调用能力
//! - `prompt_builder` - 构建提示词
//! - `result_parser` - 解析模型回复
//! - `ResultWriter` / `WarnWriter` - 写结果文档和失败清单
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个 (作文, 维度) 组合"的完整处理流程
//! - `GradingCtx` - 上下文封装（作文 + 维度）
//! - `GradingFlow` - 流程编排（prompt → LLM → parse）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，管理启动校验、并发和结果落盘
//! - `orchestrator/essay_processor` - 单篇作文处理器，遍历五个维度
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Criterion, Essay, Evaluation, ResultDocument, RubricTable};
pub use orchestrator::App;
pub use services::{ChatModel, LlmService, PromptRequest};
pub use workflow::{GradingCtx, GradingFlow};
