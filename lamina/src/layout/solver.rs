//! Size and position resolution for the node tree.

use crate::node::{LayoutKind, NodeId, NodeStyle};
use crate::primitives::{Point, Rect, Size};
use crate::tree::Tree;

use super::length::{SizeSpec, Spacing};

/// Solve the whole tree against the screen rect. The root is pinned to the
/// screen; everything below follows its node's layout kind.
pub(crate) fn solve(tree: &mut Tree, screen: Rect) {
    measure(tree, NodeId::ROOT, screen.size(), Some(screen.size()));
    if let Some(root) = tree.get_mut(NodeId::ROOT) {
        root.layout.rect = screen;
    }
    arrange(tree, NodeId::ROOT);
}

// =========================================================================
// Measure
// =========================================================================

/// Resolve a node's size against the available extent, recursively
/// measuring children. `forced` overrides the node's own size spec (used
/// for the root and for flex redistribution).
fn measure(tree: &mut Tree, id: NodeId, avail: Size, forced: Option<Size>) -> Size {
    let (style, children) = match tree.get(id) {
        Some(node) => (node.style.clone(), node.children.clone()),
        None => return Size::ZERO,
    };

    let mut width = match forced {
        Some(f) => f.width,
        None => style.width.resolve(avail.width, avail.width.max(0.0)),
    };
    let mut height = match forced {
        Some(f) => f.height,
        None => style.height.resolve(avail.height, avail.height.max(0.0)),
    };
    if forced.is_none() {
        width = clamp_axis(width, style.min_width, style.max_width, avail.width);
        height = clamp_axis(height, style.min_height, style.max_height, avail.height);
    }

    let content = Size::new(
        width - style.padding.horizontal(),
        height - style.padding.vertical(),
    )
    .max_zero();

    for &child in &children {
        measure(tree, child, content, None);
    }

    // Fit-content axes take the packed extent of the children, measured
    // above against the tentative content size.
    let fit_w = forced.is_none() && style.width.is_flexible();
    let fit_h = forced.is_none() && style.height.is_flexible();
    if fit_w || fit_h {
        let extent = flow_extent(tree, &style, &children, content);
        if fit_w {
            width = clamp_axis(
                extent.width + style.padding.horizontal(),
                style.min_width,
                style.max_width,
                avail.width,
            );
        }
        if fit_h {
            height = clamp_axis(
                extent.height + style.padding.vertical(),
                style.min_height,
                style.max_height,
                avail.height,
            );
        }
    }

    let size = Size::new(width, height).max_zero();
    if let Some(node) = tree.get_mut(id) {
        node.layout.size = size;
    }
    size
}

fn clamp_axis(value: f32, min: Option<SizeSpec>, max: Option<SizeSpec>, parent: f32) -> f32 {
    let mut v = value;
    if let Some(lo) = min.and_then(|s| clamp_value(s, parent)) {
        v = v.max(lo);
    }
    if let Some(hi) = max.and_then(|s| clamp_value(s, parent)) {
        v = v.min(hi);
    }
    v.max(0.0)
}

fn clamp_value(spec: SizeSpec, parent: f32) -> Option<f32> {
    match spec {
        SizeSpec::Pixels(v) => Some(v),
        SizeSpec::Percent(p) => Some(p * parent),
        SizeSpec::FitContent => None,
    }
}

/// Packed extent of the flow children for a given content size, per the
/// node's layout kind. Ignore-layout children never contribute.
fn flow_extent(tree: &Tree, style: &NodeStyle, children: &[NodeId], content: Size) -> Size {
    let infos = child_infos(tree, children);
    let flow: Vec<&ChildInfo> = infos.iter().filter(|c| !c.ignored).collect();

    match style.layout {
        LayoutKind::None => {
            let mut extent = Size::ZERO;
            for c in &flow {
                let x = c.left_px(content.width) + c.margin.left;
                let y = c.top_px(content.height) + c.margin.top;
                extent.width = extent.width.max(x + c.size.width + c.margin.right);
                extent.height = extent.height.max(y + c.size.height + c.margin.bottom);
            }
            extent
        }
        LayoutKind::Row => {
            let mut extent = Size::ZERO;
            for c in &flow {
                extent.width += c.size.width + c.margin.horizontal();
                extent.height = extent
                    .height
                    .max(c.size.height + c.margin.vertical());
            }
            extent
        }
        LayoutKind::Column => {
            let mut extent = Size::ZERO;
            for c in &flow {
                extent.height += c.size.height + c.margin.vertical();
                extent.width = extent.width.max(c.size.width + c.margin.horizontal());
            }
            extent
        }
        LayoutKind::Grid => {
            let count = flow.len();
            if count == 0 {
                return Size::ZERO;
            }
            let cell = grid_cell(style, &flow);
            let cols = grid_columns(content.width, cell.width, count);
            let rows = count.div_ceil(cols);
            Size::new(cols.min(count) as f32 * cell.width, rows as f32 * cell.height)
        }
        LayoutKind::Wrap => {
            let mut line_x = 0.0f32;
            let mut line_h = 0.0f32;
            let mut extent = Size::ZERO;
            for c in &flow {
                let w = c.size.width + c.margin.horizontal();
                let h = c.size.height + c.margin.vertical();
                if line_x > 0.0 && line_x + w > content.width {
                    extent.height += line_h;
                    line_x = 0.0;
                    line_h = 0.0;
                }
                line_x += w;
                line_h = line_h.max(h);
                extent.width = extent.width.max(line_x);
            }
            extent.height += line_h;
            extent
        }
    }
}

// =========================================================================
// Arrange
// =========================================================================

/// Position the children of `id` and recurse. The node's own rect must
/// already be set by its parent (or by `solve` for the root).
fn arrange(tree: &mut Tree, id: NodeId) {
    let (rect, style, children) = match tree.get(id) {
        Some(node) => (node.layout.rect, node.style.clone(), node.children.clone()),
        None => return,
    };

    let inner = rect.inset(
        style.padding.top,
        style.padding.right,
        style.padding.bottom,
        style.padding.left,
    );
    if let Some(node) = tree.get_mut(id) {
        node.layout.inner_rect = inner;
        node.layout.size = rect.size();
    }

    let mut infos = child_infos(tree, &children);

    // Flex redistribution: leftover main-axis space is split evenly among
    // flexible (fit-content) children.
    if style.scale_children
        && matches!(style.layout, LayoutKind::Row | LayoutKind::Column)
    {
        redistribute(tree, &style, inner, &mut infos);
    }

    let origin = inner.origin();
    match style.layout {
        LayoutKind::None => {
            for c in infos.iter().filter(|c| !c.ignored) {
                place_by_offset(tree, c, origin, inner.size());
            }
        }
        LayoutKind::Row => {
            let mut x = origin.x;
            for c in infos.iter().filter(|c| !c.ignored) {
                let pos = Point::new(x + c.margin.left, origin.y + c.margin.top);
                place(tree, c, pos);
                x += c.margin.horizontal() + c.size.width;
            }
        }
        LayoutKind::Column => {
            let mut y = origin.y;
            for c in infos.iter().filter(|c| !c.ignored) {
                let pos = Point::new(origin.x + c.margin.left, y + c.margin.top);
                place(tree, c, pos);
                y += c.margin.vertical() + c.size.height;
            }
        }
        LayoutKind::Grid => {
            let flow: Vec<&ChildInfo> = infos.iter().filter(|c| !c.ignored).collect();
            if !flow.is_empty() {
                let cell = grid_cell(&style, &flow);
                let cols = grid_columns(inner.width, cell.width, flow.len());
                for (i, c) in flow.iter().enumerate() {
                    let col = (i % cols) as f32;
                    let row = (i / cols) as f32;
                    let pos = Point::new(
                        origin.x + col * cell.width + c.margin.left,
                        origin.y + row * cell.height + c.margin.top,
                    );
                    place(tree, c, pos);
                }
            }
        }
        LayoutKind::Wrap => {
            let mut x = 0.0f32;
            let mut y = 0.0f32;
            let mut line_h = 0.0f32;
            for c in infos.iter().filter(|c| !c.ignored) {
                let w = c.size.width + c.margin.horizontal();
                let h = c.size.height + c.margin.vertical();
                if x > 0.0 && x + w > inner.width {
                    y += line_h;
                    x = 0.0;
                    line_h = 0.0;
                }
                let pos = Point::new(origin.x + x + c.margin.left, origin.y + y + c.margin.top);
                place(tree, c, pos);
                x += w;
                line_h = line_h.max(h);
            }
        }
    }

    // Overlays: out of flow, positioned purely by their own offsets.
    for c in infos.iter().filter(|c| c.ignored) {
        place_by_offset(tree, c, origin, inner.size());
    }

    for c in &infos {
        arrange(tree, c.id);
    }
}

/// Split leftover main-axis space among flexible children and re-measure
/// their subtrees at the forced size.
fn redistribute(tree: &mut Tree, style: &NodeStyle, inner: Rect, infos: &mut [ChildInfo]) {
    let row = style.layout == LayoutKind::Row;
    let main_extent = if row { inner.width } else { inner.height };

    let mut fixed = 0.0f32;
    let mut flex_count = 0usize;
    for c in infos.iter().filter(|c| !c.ignored) {
        let m = if row {
            c.margin.horizontal()
        } else {
            c.margin.vertical()
        };
        if c.flexible_main {
            flex_count += 1;
            fixed += m;
        } else {
            fixed += m + if row { c.size.width } else { c.size.height };
        }
    }
    if flex_count == 0 {
        return;
    }

    let share = ((main_extent - fixed) / flex_count as f32).max(0.0);
    for c in infos.iter_mut().filter(|c| !c.ignored && c.flexible_main) {
        let forced = if row {
            Size::new(share, c.size.height)
        } else {
            Size::new(c.size.width, share)
        };
        c.size = measure(tree, c.id, inner.size(), Some(forced));
    }
}

// =========================================================================
// Child bookkeeping
// =========================================================================

struct ChildInfo {
    id: NodeId,
    size: Size,
    margin: Spacing,
    left: super::length::Offset,
    top: super::length::Offset,
    ignored: bool,
    /// Fit-content on the parent's main axis; participates in flex
    /// redistribution.
    flexible_main: bool,
}

impl ChildInfo {
    fn left_px(&self, content_width: f32) -> f32 {
        self.left.resolve(content_width)
    }

    fn top_px(&self, content_height: f32) -> f32 {
        self.top.resolve(content_height)
    }
}

fn child_infos(tree: &Tree, children: &[NodeId]) -> Vec<ChildInfo> {
    children
        .iter()
        .filter_map(|&id| {
            let node = tree.get(id)?;
            let parent_kind = node
                .parent
                .and_then(|p| tree.get(p))
                .map(|p| p.style.layout)
                .unwrap_or_default();
            let flexible_main = match parent_kind {
                LayoutKind::Row => node.style.width.is_flexible(),
                LayoutKind::Column => node.style.height.is_flexible(),
                _ => false,
            };
            Some(ChildInfo {
                id,
                size: node.layout.size,
                margin: node.style.margin,
                left: node.style.left,
                top: node.style.top,
                ignored: node.style.ignore_layout,
                flexible_main,
            })
        })
        .collect()
}

fn place(tree: &mut Tree, child: &ChildInfo, pos: Point) {
    if let Some(node) = tree.get_mut(child.id) {
        node.layout.rect = Rect::from_origin_size(pos, child.size);
    }
}

fn place_by_offset(tree: &mut Tree, child: &ChildInfo, origin: Point, content: Size) {
    let pos = Point::new(
        origin.x + child.left_px(content.width) + child.margin.left,
        origin.y + child.top_px(content.height) + child.margin.top,
    );
    place(tree, child, pos);
}

fn grid_cell(style: &NodeStyle, flow: &[&ChildInfo]) -> Size {
    if let Some(cell) = style.grid_cell {
        return Size::new(cell.width.max(1.0), cell.height.max(1.0));
    }
    let mut cell = Size::new(1.0, 1.0);
    for c in flow {
        cell.width = cell.width.max(c.size.width + c.margin.horizontal());
        cell.height = cell.height.max(c.size.height + c.margin.vertical());
    }
    cell
}

fn grid_columns(content_width: f32, cell_width: f32, count: usize) -> usize {
    if cell_width <= 0.0 {
        return 1;
    }
    ((content_width / cell_width).floor() as usize).clamp(1, count.max(1))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Offset;

    fn setup(screen: Size) -> Tree {
        let mut tree = Tree::new();
        tree.begin_frame(1, screen);
        tree
    }

    fn add_child(tree: &mut Tree, parent: NodeId, occurrence: u32) -> NodeId {
        tree.resolve_child(parent, 0xCA11, occurrence, true)
    }

    fn rect_of(tree: &Tree, id: NodeId) -> Rect {
        tree.get(id).unwrap().layout.rect
    }

    #[test]
    fn row_distributes_remaining_space_to_flexible_child() {
        let mut tree = setup(Size::new(300.0, 100.0));
        {
            let root = tree.get_mut(NodeId::ROOT).unwrap();
            root.style.layout = LayoutKind::Row;
            root.style.scale_children = true;
        }
        let mut ids = Vec::new();
        for i in 0..3 {
            let id = add_child(&mut tree, NodeId::ROOT, i);
            let node = tree.get_mut(id).unwrap();
            node.style.width = SizeSpec::Percent(0.25);
            node.style.height = SizeSpec::Percent(1.0);
            ids.push(id);
        }
        let flexible = add_child(&mut tree, NodeId::ROOT, 3);
        tree.get_mut(flexible).unwrap().style.height = SizeSpec::Percent(1.0);

        solve(&mut tree, Rect::new(0.0, 0.0, 300.0, 100.0));

        assert_eq!(rect_of(&tree, ids[0]), Rect::new(0.0, 0.0, 75.0, 100.0));
        assert_eq!(rect_of(&tree, ids[1]), Rect::new(75.0, 0.0, 75.0, 100.0));
        assert_eq!(rect_of(&tree, ids[2]), Rect::new(150.0, 0.0, 75.0, 100.0));
        // The flexible child gets exactly the remaining quarter.
        assert_eq!(rect_of(&tree, flexible), Rect::new(225.0, 0.0, 75.0, 100.0));
        assert_eq!(rect_of(&tree, flexible).right(), 300.0);
    }

    #[test]
    fn wrap_packs_then_wraps_to_next_line() {
        let mut tree = setup(Size::new(100.0, 200.0));
        tree.get_mut(NodeId::ROOT).unwrap().style.layout = LayoutKind::Wrap;

        let mut ids = Vec::new();
        for i in 0..3 {
            let id = add_child(&mut tree, NodeId::ROOT, i);
            let node = tree.get_mut(id).unwrap();
            node.style.width = SizeSpec::Pixels(40.0);
            node.style.height = SizeSpec::Pixels(20.0);
            ids.push(id);
        }

        solve(&mut tree, Rect::new(0.0, 0.0, 100.0, 200.0));

        assert_eq!(rect_of(&tree, ids[0]).origin(), Point::new(0.0, 0.0));
        assert_eq!(rect_of(&tree, ids[1]).origin(), Point::new(40.0, 0.0));
        // Third child exceeds the available width and wraps.
        assert_eq!(rect_of(&tree, ids[2]).origin(), Point::new(0.0, 20.0));
    }

    #[test]
    fn column_stacks_children_with_margins() {
        let mut tree = setup(Size::new(100.0, 300.0));
        tree.get_mut(NodeId::ROOT).unwrap().style.layout = LayoutKind::Column;

        let a = add_child(&mut tree, NodeId::ROOT, 0);
        let b = add_child(&mut tree, NodeId::ROOT, 1);
        for id in [a, b] {
            let node = tree.get_mut(id).unwrap();
            node.style.width = SizeSpec::Pixels(50.0);
            node.style.height = SizeSpec::Pixels(30.0);
            node.style.margin = Spacing::all(5.0);
        }

        solve(&mut tree, Rect::new(0.0, 0.0, 100.0, 300.0));

        assert_eq!(rect_of(&tree, a).origin(), Point::new(5.0, 5.0));
        // 5 + 30 + 5 below the first child, plus its own top margin.
        assert_eq!(rect_of(&tree, b).origin(), Point::new(5.0, 45.0));
    }

    #[test]
    fn grid_wraps_overflow_to_new_rows() {
        let mut tree = setup(Size::new(100.0, 200.0));
        tree.get_mut(NodeId::ROOT).unwrap().style.layout = LayoutKind::Grid;

        let mut ids = Vec::new();
        for i in 0..3 {
            let id = add_child(&mut tree, NodeId::ROOT, i);
            let node = tree.get_mut(id).unwrap();
            node.style.width = SizeSpec::Pixels(50.0);
            node.style.height = SizeSpec::Pixels(50.0);
            ids.push(id);
        }

        solve(&mut tree, Rect::new(0.0, 0.0, 100.0, 200.0));

        assert_eq!(rect_of(&tree, ids[0]).origin(), Point::new(0.0, 0.0));
        assert_eq!(rect_of(&tree, ids[1]).origin(), Point::new(50.0, 0.0));
        assert_eq!(rect_of(&tree, ids[2]).origin(), Point::new(0.0, 50.0));
    }

    #[test]
    fn requested_grid_cell_overrides_child_sizes() {
        let mut tree = setup(Size::new(90.0, 200.0));
        {
            let root = tree.get_mut(NodeId::ROOT).unwrap();
            root.style.layout = LayoutKind::Grid;
            root.style.grid_cell = Some(Size::new(30.0, 30.0));
        }
        let mut ids = Vec::new();
        for i in 0..4 {
            let id = add_child(&mut tree, NodeId::ROOT, i);
            let node = tree.get_mut(id).unwrap();
            node.style.width = SizeSpec::Pixels(10.0);
            node.style.height = SizeSpec::Pixels(10.0);
            ids.push(id);
        }

        solve(&mut tree, Rect::new(0.0, 0.0, 90.0, 200.0));

        assert_eq!(rect_of(&tree, ids[2]).origin(), Point::new(60.0, 0.0));
        assert_eq!(rect_of(&tree, ids[3]).origin(), Point::new(0.0, 30.0));
    }

    #[test]
    fn fit_content_parent_sizes_to_children() {
        let mut tree = setup(Size::new(400.0, 400.0));
        let panel = add_child(&mut tree, NodeId::ROOT, 0);
        {
            let node = tree.get_mut(panel).unwrap();
            node.style.layout = LayoutKind::Row;
            node.style.padding = Spacing::all(4.0);
        }
        for i in 0..2 {
            let id = tree.resolve_child(panel, 0xBEEF, i, true);
            let node = tree.get_mut(id).unwrap();
            node.style.width = SizeSpec::Pixels(30.0);
            node.style.height = SizeSpec::Pixels(10.0);
        }

        solve(&mut tree, Rect::new(0.0, 0.0, 400.0, 400.0));

        let size = rect_of(&tree, panel).size();
        assert_eq!(size, Size::new(68.0, 18.0)); // 2*30 + padding, 10 + padding
    }

    #[test]
    fn zero_space_resolves_percent_children_to_zero() {
        let mut tree = setup(Size::new(200.0, 200.0));
        let panel = add_child(&mut tree, NodeId::ROOT, 0);
        {
            let node = tree.get_mut(panel).unwrap();
            node.style.width = SizeSpec::Pixels(0.0);
            node.style.height = SizeSpec::Pixels(0.0);
            node.style.layout = LayoutKind::Row;
        }
        let child = tree.resolve_child(panel, 0xBEEF, 0, true);
        {
            let node = tree.get_mut(child).unwrap();
            node.style.width = SizeSpec::Percent(0.5);
            node.style.height = SizeSpec::Percent(0.5);
        }

        solve(&mut tree, Rect::new(0.0, 0.0, 200.0, 200.0));

        assert_eq!(rect_of(&tree, child).size(), Size::ZERO);
    }

    #[test]
    fn ignore_layout_child_skips_flow_and_uses_offsets() {
        let mut tree = setup(Size::new(500.0, 500.0));
        let panel = add_child(&mut tree, NodeId::ROOT, 0);
        {
            let node = tree.get_mut(panel).unwrap();
            node.style.width = SizeSpec::Pixels(500.0);
            node.style.height = SizeSpec::Pixels(500.0);
            node.style.layout = LayoutKind::Row;
        }

        let a = tree.resolve_child(panel, 0xBEEF, 0, true);
        {
            let node = tree.get_mut(a).unwrap();
            node.style.width = SizeSpec::Pixels(100.0);
            node.style.height = SizeSpec::Pixels(100.0);
        }
        let b = tree.resolve_child(panel, 0xBEEF, 1, true);
        {
            let node = tree.get_mut(b).unwrap();
            node.style.width = SizeSpec::Pixels(100.0);
            node.style.height = SizeSpec::Pixels(100.0);
        }
        // Footer overlay, positioned at 90% height, out of flow.
        let footer = tree.resolve_child(panel, 0xBEEF, 2, true);
        {
            let node = tree.get_mut(footer).unwrap();
            node.style.width = SizeSpec::Percent(1.0);
            node.style.height = SizeSpec::Percent(0.1);
            node.style.top = Offset::Percent(0.9);
            node.style.ignore_layout = true;
        }

        solve(&mut tree, Rect::new(0.0, 0.0, 500.0, 500.0));

        // Flow children unaffected by the overlay.
        assert_eq!(rect_of(&tree, a).origin(), Point::new(0.0, 0.0));
        assert_eq!(rect_of(&tree, b).origin(), Point::new(100.0, 0.0));
        assert_eq!(rect_of(&tree, footer), Rect::new(0.0, 450.0, 500.0, 50.0));
    }

    #[test]
    fn max_width_clamps_percent_size() {
        let mut tree = setup(Size::new(300.0, 100.0));
        let id = add_child(&mut tree, NodeId::ROOT, 0);
        {
            let node = tree.get_mut(id).unwrap();
            node.style.width = SizeSpec::Percent(1.0);
            node.style.height = SizeSpec::Pixels(10.0);
            node.style.max_width = Some(SizeSpec::Pixels(80.0));
        }

        solve(&mut tree, Rect::new(0.0, 0.0, 300.0, 100.0));
        assert_eq!(rect_of(&tree, id).width, 80.0);
    }

    #[test]
    fn padding_insets_flow_children_and_inner_rect() {
        let mut tree = setup(Size::new(100.0, 100.0));
        {
            let root = tree.get_mut(NodeId::ROOT).unwrap();
            root.style.layout = LayoutKind::Row;
            root.style.padding = Spacing::all(5.0);
        }
        let id = add_child(&mut tree, NodeId::ROOT, 0);
        {
            let node = tree.get_mut(id).unwrap();
            node.style.width = SizeSpec::Pixels(20.0);
            node.style.height = SizeSpec::Pixels(20.0);
        }

        solve(&mut tree, Rect::new(0.0, 0.0, 100.0, 100.0));

        assert_eq!(rect_of(&tree, id).origin(), Point::new(5.0, 5.0));
        assert_eq!(
            tree.get(NodeId::ROOT).unwrap().layout.inner_rect,
            Rect::new(5.0, 5.0, 90.0, 90.0)
        );
    }
}
