//! Idea 请求端
//!
//! 与浏览器脚本同样的约定：维护当前选中的 category，调用代理，渲染结果。
//! 同一时刻只允许一个请求在途，触发状态由 guard 在任何结果下恰好恢复一次。

use parking_lot::RwLock;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{ErrorResponse, IdeaRequest, IdeaResponse};

/// 默认 category
pub const DEFAULT_CATEGORY: &str = "General";

/// 页面上提供的 category
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "General",
    "Software",
    "Hardware",
    "AI/ML",
    "Sustainability",
    "Education",
    "Health",
];

/// 请求失败时显示的文本
pub const ERROR_FALLBACK_TEXT: &str = "Error fetching idea. Try again.";

const UNKNOWN_ERROR: &str = "An unknown error occurred.";

/// 请求端错误
#[derive(Debug, Error)]
pub enum RequesterError {
    /// 无法连接代理
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// 代理返回非 2xx
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// 代理返回 2xx 但没有 idea
    #[error("An unknown error occurred.")]
    Malformed,
}

/// 一次请求后的显示内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdeaView {
    /// idea 区域的文本
    pub text: String,
    /// 错误区域的文本，成功时为空
    pub error: Option<String>,
}

/// `request_idea` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// 请求完成并已渲染
    Rendered(IdeaView),
    /// 已有请求在途，本次触发被忽略
    Ignored,
}

/// category 选择状态，`active` 下标保证恰好一个选中项
struct CategoryBoard {
    categories: Vec<String>,
    active: usize,
}

/// 触发器占用标记，drop 时恢复
struct TriggerGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TriggerGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for TriggerGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Idea 请求端
pub struct IdeaRequester {
    http: Client,
    endpoint: String,
    board: RwLock<CategoryBoard>,
    in_flight: AtomicBool,
    last_view: RwLock<Option<IdeaView>>,
}

impl IdeaRequester {
    /// 使用默认 category 列表创建
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RequesterError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        let categories = DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            board: RwLock::new(CategoryBoard {
                categories,
                active: 0,
            }),
            in_flight: AtomicBool::new(false),
            last_view: RwLock::new(None),
        })
    }

    /// 所有可选 category
    pub fn categories(&self) -> Vec<String> {
        self.board.read().categories.clone()
    }

    /// 当前选中的 category
    pub fn active_category(&self) -> String {
        let board = self.board.read();
        board.categories[board.active].clone()
    }

    /// 每个 category 是否处于选中状态
    pub fn active_markers(&self) -> Vec<bool> {
        let board = self.board.read();
        (0..board.categories.len()).map(|i| i == board.active).collect()
    }

    /// 选择 category，未知 id 被忽略并返回 false
    pub fn select_category(&self, id: &str) -> bool {
        let mut board = self.board.write();
        match board.categories.iter().position(|c| c == id) {
            Some(index) => {
                board.active = index;
                debug!("Selected category: {}", id);
                true
            }
            None => {
                debug!("Ignoring unknown category: {}", id);
                false
            }
        }
    }

    /// 触发器是否可用
    pub fn is_ready(&self) -> bool {
        !self.in_flight.load(Ordering::Acquire)
    }

    /// 最近一次渲染的内容
    pub fn last_view(&self) -> Option<IdeaView> {
        self.last_view.read().clone()
    }

    /// 请求一个 idea
    ///
    /// 已有请求在途时立即返回 `Ignored`，不排队。
    pub async fn request_idea(&self) -> RequestOutcome {
        let Some(_guard) = TriggerGuard::acquire(&self.in_flight) else {
            debug!("Idea request already in flight, ignoring trigger");
            return RequestOutcome::Ignored;
        };

        let category = self.active_category();
        let view = match self.fetch_idea(&category).await {
            Ok(idea) => {
                info!("Received idea for category: {}", category);
                IdeaView {
                    text: idea,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Error generating idea: {}", e);
                let message = e.to_string();
                IdeaView {
                    text: ERROR_FALLBACK_TEXT.to_string(),
                    error: Some(if message.is_empty() {
                        UNKNOWN_ERROR.to_string()
                    } else {
                        message
                    }),
                }
            }
        };

        *self.last_view.write() = Some(view.clone());
        RequestOutcome::Rendered(view)
    }

    async fn fetch_idea(&self, category: &str) -> Result<String, RequesterError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&IdeaRequest::new(category))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&body)
                .ok()
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
            return Err(RequesterError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice::<IdeaResponse>(&body)
            .map(|r| r.idea)
            .map_err(|_| RequesterError::Malformed)
    }
}
