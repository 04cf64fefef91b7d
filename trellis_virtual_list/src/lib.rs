// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trellis Virtual List: row recycling for long scrolling lists.
//!
//! A list view only ever shows a screenful of rows. The controllers in this
//! crate keep a small pool of row visuals, made and filled by a host-supplied
//! [`CollectionBinder`], and move them around as the list scrolls:
//!
//! - [`FixedHeightVirtualizationController`]: every item has the same height,
//!   so index and offset convert in constant time.
//! - [`DynamicHeightVirtualizationController`]: items are measured after
//!   layout; unmeasured ones are estimated with the running average.
//!
//! Both implement [`CollectionVirtualizationController`]. A row is rebound only
//! when the index it shows changes; scrolling within the bound window only
//! updates row positions.
//!
//! Drag reordering sits on top: [`ListViewDragger`] runs the pointer protocol
//! (threshold, edge auto-scroll, drop classification) and asks a
//! [`DragAndDropController`] what a drop means. [`ListViewDraggerAnimated`]
//! parts the list at the insertion point instead of drawing a drop line, and
//! [`ReorderableDragAndDropController`] reorders a shared `Vec`.
//!
//! ## Example
//!
//! ```
//! use trellis_virtual_list::{
//!     CollectionBinder, CollectionVirtualizationController, FixedHeightVirtualizationController,
//! };
//!
//! /// Rows are strings showing their item.
//! struct Labels(usize);
//!
//! impl CollectionBinder for Labels {
//!     type Item = String;
//!     fn item_count(&self) -> usize { self.0 }
//!     fn make_item(&mut self) -> String { String::new() }
//!     fn bind_item(&mut self, row: &mut String, index: usize) { *row = format!("item {index}"); }
//!     fn unbind_item(&mut self, row: &mut String, _index: usize) { row.clear(); }
//!     fn destroy_item(&mut self, _row: String) {}
//! }
//!
//! let mut list = FixedHeightVirtualizationController::new(Labels(1000), 20.0);
//! list.resize(200.0);
//! list.on_scroll(505.0);
//!
//! assert_eq!(list.first_visible_index(), 25);
//! let rows = list.active_items();
//! assert_eq!(rows.len(), 12);
//! assert_eq!(rows[0].item(), "item 25");
//! assert_eq!(rows[11].item(), "item 36");
//! ```

mod controller;
mod drag;
mod drag_animated;
mod dynamic;
mod fixed;
mod reorder;

pub use controller::{
    CollectionBinder, CollectionVirtualizationController, ItemOf, RecycledItem, ScrollTarget,
};
pub use drag::{
    DragAndDropController, DragArgs, DragPosition, DragSettings, DragVisualMode, DropIndicator,
    DropPosition, ListViewDragger, StartDragArgs,
};
pub use drag_animated::{ListViewDraggerAnimated, PADDING_ANIMATION_MS};
pub use dynamic::{DEFAULT_ANCHOR_EPSILON, DynamicHeightVirtualizationController};
pub use fixed::FixedHeightVirtualizationController;
pub use reorder::{ReorderableDragAndDropController, reorder_items};
