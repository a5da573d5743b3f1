//! Cart Store
//! 訪問者セッション単位のカート状態（商品行・数量・パネル表示・一回限りのプロンプト）

use crate::models::OrderItem;

// ========================================
// Types
// ========================================

/// カート追加時点の商品スナップショット
///
/// 元の商品への参照ではないため、後から管理画面で商品を編集しても
/// カート内の行は変わらない。
#[derive(Debug, Clone, PartialEq)]
pub struct CartProduct {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub weight: String,
    pub image: String,
}

/// カート行（quantity は常に 1 以上）
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: CartProduct,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// セッションのカート
///
/// ブラウザセッションごとに 1 インスタンス。永続化はしない。
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    lines: Vec<CartLine>,
    is_cart_open: bool,
    has_shown_fast_order: bool,
}

// ========================================
// Operations
// ========================================

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加順の行一覧
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product.id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 既存行があれば +1、なければ数量 1 で末尾に追加
    pub fn add_to_cart(&mut self, product: &CartProduct) {
        match self.lines.iter_mut().find(|l| l.product.id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
            }),
        }
    }

    /// カタログの「カートに追加」ボタン
    ///
    /// 追加したうえで、ファストオーダーのプロンプトを開くべきかを返す。
    pub fn add_from_catalog(&mut self, product: &CartProduct) -> bool {
        self.add_to_cart(product);
        self.show_fast_order_once()
    }

    /// 数量 -1（数量 1 の行は削除、存在しない id は何もしない）
    pub fn decrement_quantity(&mut self, product_id: &str) {
        let Some(pos) = self.lines.iter().position(|l| l.product.id == product_id) else {
            return;
        };
        if self.lines[pos].quantity > 1 {
            self.lines[pos].quantity -= 1;
        } else {
            self.lines.remove(pos);
        }
    }

    pub fn remove_from_cart(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product.id != product_id);
    }

    /// 注文送信成功後にのみ呼ぶ
    pub fn clear_cart(&mut self) {
        self.lines.clear();
    }

    /// 数量の合計
    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// 数量 × 価格 の合計
    pub fn total_price(&self) -> f64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn is_cart_open(&self) -> bool {
        self.is_cart_open
    }

    pub fn set_cart_open(&mut self, open: bool) {
        self.is_cart_open = open;
    }

    /// セッション中の最初の呼び出しだけ true
    pub fn show_fast_order_once(&mut self) -> bool {
        if self.has_shown_fast_order {
            return false;
        }
        self.has_shown_fast_order = true;
        true
    }

    /// 注文ペイロード用の {name, quantity} 一覧
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|l| OrderItem {
                name: l.product.name.clone(),
                quantity: l.quantity,
            })
            .collect()
    }
}

// ========================================
// Exit intent
// ========================================

/// 離脱時クーポンのポップアップ判定
///
/// ポインタがビューポート上端（client_y <= 0）から出た最初の 1 回だけ開く。
#[derive(Debug, Clone, Default)]
pub struct ExitIntentGate {
    has_shown: bool,
}

impl ExitIntentGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// mouseleave イベント。ポップアップを開くべきなら true
    pub fn on_mouse_leave(&mut self, client_y: f64) -> bool {
        if client_y > 0.0 || self.has_shown {
            return false;
        }
        self.has_shown = true;
        true
    }

    pub fn has_shown(&self) -> bool {
        self.has_shown
    }
}
