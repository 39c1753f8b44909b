//! 浮动翻译按钮
//!
//! [`FloatingControl`] 只负责拖动与点击的判定和视口约束；
//! [`ExtensionController`] 拥有按钮实例和位置存储，管理初始化、图标切换和销毁。

use serde::{Deserialize, Serialize};

use super::storage::KeyValueStore;
use crate::translation::config::constants;
use crate::translation::core::ExtensionMessage;
use crate::translation::error::TranslationResult;

/// 屏幕坐标
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 宽高
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// 把位置限制在视口内：横向允许露出一半，纵向完整可见
pub fn clamp_position(position: Position, control: Size, viewport: Size) -> Position {
    let min_x = -control.width / 2.0;
    let max_x = (viewport.width - control.width / 2.0).max(min_x);
    let max_y = (viewport.height - control.height).max(0.0);

    Position {
        x: position.x.clamp(min_x, max_x),
        y: position.y.clamp(0.0, max_y),
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    pointer: Position,
    origin: Position,
    moved: bool,
}

/// 指针松开后的判定
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerRelease {
    /// 移动不超过阈值，视为点击
    Click,
    /// 拖动结束于该位置
    Moved(Position),
}

/// 浮动按钮
#[derive(Debug, Clone)]
pub struct FloatingControl {
    position: Position,
    size: Size,
    visible: bool,
    drag: Option<Drag>,
}

impl FloatingControl {
    pub fn new(position: Position, size: Size) -> Self {
        Self {
            position,
            size,
            visible: true,
            drag: None,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some_and(|drag| drag.moved)
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        self.drag = Some(Drag {
            pointer: Position::new(x, y),
            origin: self.position,
            moved: false,
        });
    }

    /// 移动超过阈值后开始拖动，返回新位置
    pub fn pointer_move(&mut self, x: f64, y: f64, viewport: Size) -> Option<Position> {
        let drag = self.drag.as_mut()?;
        let dx = x - drag.pointer.x;
        let dy = y - drag.pointer.y;

        if !drag.moved && dx.hypot(dy) <= constants::DRAG_THRESHOLD_PX {
            return None;
        }
        drag.moved = true;

        let target = Position::new(drag.origin.x + dx, drag.origin.y + dy);
        self.position = clamp_position(target, self.size, viewport);
        Some(self.position)
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, viewport: Size) -> Option<PointerRelease> {
        self.pointer_move(x, y, viewport);
        let drag = self.drag.take()?;

        Some(if drag.moved {
            PointerRelease::Moved(self.position)
        } else {
            PointerRelease::Click
        })
    }

    /// 视口变化后重新约束位置
    pub fn fit(&mut self, viewport: Size) {
        self.position = clamp_position(self.position, self.size, viewport);
    }
}

/// 控制器事件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// 点击按钮，开始翻译选区
    Translate,
    /// 拖动结束，位置已保存
    Moved(Position),
    None,
}

/// 扩展内容侧控制器
pub struct ExtensionController<S> {
    store: S,
    control: Option<FloatingControl>,
    size: Size,
    viewport: Size,
}

impl<S: KeyValueStore> ExtensionController<S> {
    pub fn new(store: S, size: Size, viewport: Size) -> Self {
        Self {
            store,
            control: None,
            size,
            viewport,
        }
    }

    /// 创建按钮，位置取自存储，缺失或损坏时使用默认位置
    pub fn init(&mut self) -> &FloatingControl {
        let saved = match self.store.get(constants::POSITION_KEY) {
            Ok(Some(value)) => serde_json::from_value::<Position>(value)
                .map_err(|e| tracing::warn!("忽略损坏的按钮位置: {}", e))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("读取按钮位置失败: {}", e);
                None
            }
        };

        let position = clamp_position(saved.unwrap_or_else(|| self.default_position()), self.size, self.viewport);
        tracing::info!("浮动按钮初始化于 ({}, {})", position.x, position.y);
        self.control.insert(FloatingControl::new(position, self.size))
    }

    /// 移除按钮
    pub fn teardown(&mut self) {
        if self.control.take().is_some() {
            tracing::info!("浮动按钮已移除");
        }
    }

    pub fn control(&self) -> Option<&FloatingControl> {
        self.control.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 右侧垂直居中
    fn default_position(&self) -> Position {
        Position::new(
            self.viewport.width - self.size.width - 20.0,
            (self.viewport.height - self.size.height) / 2.0,
        )
    }

    /// 处理来自后台的消息，返回是否已处理
    pub fn handle_message(&mut self, message: &ExtensionMessage) -> bool {
        match message {
            ExtensionMessage::ToggleTranslator => {
                self.toggle();
                true
            }
            ExtensionMessage::Translate(_) => false,
        }
    }

    /// 图标点击：没有按钮时创建，否则切换可见性
    pub fn toggle(&mut self) {
        match self.control.as_mut() {
            Some(control) => {
                let visible = !control.is_visible();
                control.set_visible(visible);
                tracing::debug!("浮动按钮可见性: {}", visible);
            }
            None => {
                self.init();
            }
        }
    }

    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
        if let Some(control) = self.control.as_mut() {
            control.fit(viewport);
        }
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        if let Some(control) = self.control.as_mut() {
            control.pointer_down(x, y);
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<Position> {
        let viewport = self.viewport;
        self.control.as_mut()?.pointer_move(x, y, viewport)
    }

    /// 松开指针：点击触发翻译，拖动结束时保存位置
    pub fn pointer_up(&mut self, x: f64, y: f64) -> TranslationResult<ControlEvent> {
        let viewport = self.viewport;
        let Some(release) = self.control.as_mut().and_then(|c| c.pointer_up(x, y, viewport)) else {
            return Ok(ControlEvent::None);
        };

        match release {
            PointerRelease::Click => Ok(ControlEvent::Translate),
            PointerRelease::Moved(position) => {
                self.store
                    .set(constants::POSITION_KEY, serde_json::to_value(position)?)?;
                Ok(ControlEvent::Moved(position))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::storage::MemoryStore;
    use serde_json::json;

    const BUTTON: Size = Size { width: 40.0, height: 40.0 };
    const VIEWPORT: Size = Size { width: 800.0, height: 600.0 };

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(
            clamp_position(Position::new(-100.0, -5.0), BUTTON, VIEWPORT),
            Position::new(-20.0, 0.0)
        );
        assert_eq!(
            clamp_position(Position::new(900.0, 700.0), BUTTON, VIEWPORT),
            Position::new(780.0, 560.0)
        );
    }

    #[test]
    fn test_small_movement_is_a_click() {
        let mut control = FloatingControl::new(Position::new(100.0, 100.0), BUTTON);
        control.pointer_down(10.0, 10.0);
        assert_eq!(control.pointer_move(13.0, 13.0, VIEWPORT), None);
        assert_eq!(control.pointer_up(13.0, 13.0, VIEWPORT), Some(PointerRelease::Click));
        assert_eq!(control.position(), Position::new(100.0, 100.0));
    }

    #[test]
    fn test_drag_saves_position() {
        let mut controller = ExtensionController::new(MemoryStore::new(), BUTTON, VIEWPORT);
        controller.init();

        controller.pointer_down(0.0, 0.0);
        controller.pointer_move(-1000.0, 50.0);
        let event = controller.pointer_up(-1000.0, 50.0).unwrap();

        let expected = Position::new(-20.0, 330.0);
        assert_eq!(event, ControlEvent::Moved(expected));
        assert_eq!(
            controller.store().get(constants::POSITION_KEY).unwrap(),
            Some(json!({"x": -20.0, "y": 330.0}))
        );
    }

    #[test]
    fn test_init_restores_saved_position() {
        let store = MemoryStore::new();
        store
            .set(constants::POSITION_KEY, json!({"x": 12.0, "y": 34.0}))
            .unwrap();

        let mut controller = ExtensionController::new(store, BUTTON, VIEWPORT);
        assert_eq!(controller.init().position(), Position::new(12.0, 34.0));
    }

    #[test]
    fn test_toggle_lifecycle() {
        let mut controller = ExtensionController::new(MemoryStore::new(), BUTTON, VIEWPORT);
        assert!(controller.control().is_none());

        assert!(controller.handle_message(&ExtensionMessage::ToggleTranslator));
        assert!(controller.control().is_some_and(FloatingControl::is_visible));

        controller.toggle();
        assert!(!controller.control().is_some_and(FloatingControl::is_visible));

        controller.teardown();
        assert!(controller.control().is_none());
        assert_eq!(controller.pointer_up(0.0, 0.0).unwrap(), ControlEvent::None);
    }
}
