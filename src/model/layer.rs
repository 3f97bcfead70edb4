use serde_json::{Map, Number, Value};

use super::{
    ArchivedAttributedString, BooleanOperation, Color, CurveMode, FileReference,
    LayerListExpandedType, ResizingType, Style, tagged,
};
use crate::codec::{Point, PointList};

record! {
    /// One node of a page's layer tree.
    ///
    /// Every layer kind (group, artboard, shape, text, symbol instance,
    /// bitmap, ...) shares this record; `_class` says which one it is and
    /// kind-specific fields are simply absent on the others.
    pub struct Layer {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        name: String,
        frame: Rect,
        is_flipped_horizontal: bool,
        is_flipped_vertical: bool,
        is_locked: bool,
        is_visible: bool,
        resizes_content: bool,
        resizing_constraint: Number,
        resizing_type: Number,
        radius: Number,
        rotation: Number,
        should_break_mask_chain: bool,
        style: Style,
        layers: Vec<Layer>,
        attributed_string: AttributedString,
        automatically_draw_on_underlying_path: bool,
        background_color: Color,
        boolean_operation: Number,
        clipping_mask: PointList,
        clipping_mask_mode: Number,
        dont_synchronise_with_symbol: bool,
        edited: bool,
        export_options: ExportOptions,
        fill_replaces_image: bool,
        fixed_radius: Number,
        glyph_bounds: PointList,
        has_background_color: bool,
        has_click_through: bool,
        has_clipping_mask: bool,
        has_converted_to_new_round_corners: bool,
        height_is_clipped: bool,
        horizontal_ruler_data: RulerData,
        horizontal_spacing: Number,
        image: FileReference,
        include_background_color_in_export: bool,
        include_background_color_in_instance: bool,
        include_in_cloud_upload: bool,
        is_closed: bool,
        is_equilateral: bool,
        layout: LayoutGrid,
        layer_list_expanded_type: Number,
        line_spacing_behaviour: Number,
        master_influence_edge_max_x_padding: Number,
        master_influence_edge_max_y_padding: Number,
        master_influence_edge_min_x_padding: Number,
        master_influence_edge_min_y_padding: Number,
        number_of_points: Number,
        name_is_fixed: bool,
        nine_slice_center_rect: PointList,
        nine_slice_scale: Point,
        #[serde(rename = "originalObjectID")]
        original_object_id: String,
        overrides: Map<String, Value>,
        path: ShapePath,
        points: Vec<CurvePoint>,
        #[serde(rename = "symbolID")]
        symbol_id: String,
        text_behaviour: Number,
        vertical_ruler_data: RulerData,
        vertical_spacing: Number,
        winding_rule: Number,
    }
}

impl Layer {
    pub fn children(&self) -> &[Layer] {
        self.layers.as_deref().unwrap_or_default()
    }

    /// Visit this layer and all descendants depth first, parents before
    /// children. `depth` is 0 for `self`.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Layer, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a Layer, usize)) {
        visit(self, depth);
        for child in self.children() {
            child.walk_at(depth + 1, visit);
        }
    }

    pub fn resizing(&self) -> Option<ResizingType> {
        tagged(&self.resizing_type, ResizingType::from_i64)
    }

    pub fn boolean(&self) -> Option<BooleanOperation> {
        tagged(&self.boolean_operation, BooleanOperation::from_i64)
    }

    pub fn list_expanded(&self) -> Option<LayerListExpandedType> {
        tagged(&self.layer_list_expanded_type, LayerListExpandedType::from_i64)
    }

    /// Curve points of a shape path, whichever place the file keeps them.
    pub fn curve_points(&self) -> &[CurvePoint] {
        self.points
            .as_deref()
            .or_else(|| self.path.as_ref()?.points.as_deref())
            .unwrap_or_default()
    }

    /// Plain text of a text layer.
    pub fn text(&self) -> Option<&str> {
        let attributed = self.attributed_string.as_ref()?;
        attributed
            .archived_attributed_string
            .as_ref()
            .and_then(ArchivedAttributedString::plain_text)
            .or(attributed.string.as_deref())
    }
}

record! {
    pub struct Rect {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        constrain_proportions: bool,
        height: Number,
        width: Number,
        x: Number,
        y: Number,
    }
}

record! {
    pub struct CurvePoint {
        #[serde(rename = "_class")]
        class: String,
        corner_radius: Number,
        curve_from: Point,
        curve_mode: Number,
        curve_to: Point,
        has_curve_from: bool,
        has_curve_to: bool,
        point: Point,
    }
}

impl CurvePoint {
    pub fn mode(&self) -> Option<CurveMode> {
        tagged(&self.curve_mode, CurveMode::from_i64)
    }
}

record! {
    pub struct ShapePath {
        #[serde(rename = "_class")]
        class: String,
        point_radius_behaviour: Number,
        is_closed: bool,
        points: Vec<CurvePoint>,
    }
}

record! {
    pub struct AttributedString {
        #[serde(rename = "_class")]
        class: String,
        archived_attributed_string: ArchivedAttributedString,
        /// Plain string form written by newer files next to the archive.
        string: String,
    }
}

record! {
    pub struct ExportOptions {
        #[serde(rename = "_class")]
        class: String,
        export_formats: Vec<ExportFormat>,
        included_layer_ids: Vec<String>,
        layer_options: Number,
        should_trim: bool,
    }
}

record! {
    pub struct ExportFormat {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        absolute_size: Number,
        file_format: String,
        name: String,
        naming_scheme: Number,
        scale: Number,
        visible_scale_type: Number,
    }
}

record! {
    pub struct RulerData {
        #[serde(rename = "_class")]
        class: String,
        base: Number,
        guides: Vec<Number>,
    }
}

record! {
    pub struct LayoutGrid {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        column_width: Number,
        draw_horizontal: bool,
        draw_horizontal_lines: bool,
        draw_vertical: bool,
        gutter_height: Number,
        gutter_width: Number,
        gutter_outside: bool,
        horizontal_offset: Number,
        is_enabled: bool,
        number_of_columns: Number,
        row_height_multiplication: Number,
        total_width: Number,
    }
}
