//! 视图宿主
//!
//! 页面上插入、替换、移除视图以及显示提示框的边界。
//! [`MemoryHost`] 在内存中记录这些操作，供命令行和测试使用。

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::view::TranslationView;
use crate::parsers::html::SelectionRange;
use crate::translation::error::{TranslationError, TranslationResult};

/// 视图标识
pub type ViewId = u64;

/// 视图宿主
pub trait ViewHost {
    /// 在选区之后插入视图；选区已失效时返回 [`TranslationError::Insertion`]
    fn insert_after<R: SelectionRange>(&self, range: &R, view: &TranslationView) -> TranslationResult<ViewId>;

    /// 替换视图内容；视图已不在页面上时返回 `false`
    fn replace(&self, id: ViewId, view: &TranslationView) -> bool;

    fn is_attached(&self, id: ViewId) -> bool;

    fn remove(&self, id: ViewId) -> bool;

    /// 当前视图
    fn view(&self, id: ViewId) -> Option<TranslationView>;

    fn show_tooltip(&self, message: &str);
}

#[derive(Debug, Default)]
struct HostState {
    views: BTreeMap<ViewId, TranslationView>,
    tooltips: Vec<String>,
    next_id: ViewId,
}

/// 内存中的视图宿主，克隆后共享同一份状态
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    state: Arc<Mutex<HostState>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        // 持锁期间不会 panic，中毒时直接取回数据
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn view_ids(&self) -> Vec<ViewId> {
        self.lock().views.keys().copied().collect()
    }

    pub fn tooltips(&self) -> Vec<String> {
        self.lock().tooltips.clone()
    }

    /// 模拟页面移除全部视图
    pub fn clear(&self) {
        self.lock().views.clear();
    }
}

impl ViewHost for MemoryHost {
    fn insert_after<R: SelectionRange>(&self, range: &R, view: &TranslationView) -> TranslationResult<ViewId> {
        if !range.is_attached() {
            return Err(TranslationError::Insertion("选区已不在页面上".to_string()));
        }

        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.views.insert(id, view.clone());
        tracing::debug!("插入视图 #{}", id);
        Ok(id)
    }

    fn replace(&self, id: ViewId, view: &TranslationView) -> bool {
        match self.lock().views.get_mut(&id) {
            Some(slot) => {
                *slot = view.clone();
                true
            }
            None => false,
        }
    }

    fn is_attached(&self, id: ViewId) -> bool {
        self.lock().views.contains_key(&id)
    }

    fn remove(&self, id: ViewId) -> bool {
        self.lock().views.remove(&id).is_some()
    }

    fn view(&self, id: ViewId) -> Option<TranslationView> {
        self.lock().views.get(&id).cloned()
    }

    fn show_tooltip(&self, message: &str) {
        tracing::info!("提示: {}", message);
        self.lock().tooltips.push(message.to_string());
    }
}
