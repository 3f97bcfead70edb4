use serde_json::Number;

use super::{
    BlendMode, BorderPosition, FillType, LineCapStyle, LineDecorationType, LineJoinStyle,
    PatternFillType, tagged,
};
use crate::codec::{Archive, Point};

record! {
    /// Visual style of a layer or shared style.
    pub struct Style {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        blur: Blur,
        borders: Vec<Border>,
        border_options: BorderOptions,
        context_settings: GraphicContextSettings,
        color_controls: ColorControls,
        start_decoration_type: Number,
        end_decoration_type: Number,
        fills: Vec<Fill>,
        inner_shadows: Vec<Shadow>,
        miter_limit: Number,
        shadows: Vec<Shadow>,
        #[serde(rename = "sharedObjectID")]
        shared_object_id: String,
        text_style: TextStyle,
    }
}

impl Style {
    pub fn start_decoration(&self) -> Option<LineDecorationType> {
        tagged(&self.start_decoration_type, LineDecorationType::from_i64)
    }

    pub fn end_decoration(&self) -> Option<LineDecorationType> {
        tagged(&self.end_decoration_type, LineDecorationType::from_i64)
    }

    /// Fills that are switched on, in paint order.
    pub fn enabled_fills(&self) -> impl Iterator<Item = &Fill> {
        self.fills
            .iter()
            .flatten()
            .filter(|fill| fill.is_enabled.unwrap_or(true))
    }
}

record! {
    pub struct Color {
        #[serde(rename = "_class")]
        class: String,
        alpha: Number,
        blue: Number,
        green: Number,
        red: Number,
    }
}

impl Color {
    /// `#rrggbbaa`, when all four channels are present.
    pub fn to_hex(&self) -> Option<String> {
        let channel = |value: &Option<Number>| {
            value
                .as_ref()
                .and_then(Number::as_f64)
                .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        };
        Some(format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            channel(&self.red)?,
            channel(&self.green)?,
            channel(&self.blue)?,
            channel(&self.alpha)?
        ))
    }
}

record! {
    pub struct GraphicContextSettings {
        #[serde(rename = "_class")]
        class: String,
        blend_mode: Number,
        opacity: Number,
    }
}

impl GraphicContextSettings {
    pub fn blend(&self) -> Option<BlendMode> {
        tagged(&self.blend_mode, BlendMode::from_i64)
    }
}

record! {
    /// Drop shadow or inner shadow; both share one shape.
    pub struct Shadow {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        blur_radius: Number,
        color: Color,
        context_settings: GraphicContextSettings,
        is_enabled: bool,
        offset_x: Number,
        offset_y: Number,
        spread: Number,
    }
}

record! {
    pub struct ColorControls {
        #[serde(rename = "_class")]
        class: String,
        brightness: Number,
        contrast: Number,
        hue: Number,
        is_enabled: bool,
        saturation: Number,
    }
}

record! {
    pub struct Fill {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        color: Color,
        fill_type: Number,
        gradient: Gradient,
        is_enabled: bool,
        noise_index: Number,
        noise_intensity: Number,
        pattern_fill_type: Number,
        pattern_tile_scale: Number,
    }
}

impl Fill {
    pub fn kind(&self) -> Option<FillType> {
        tagged(&self.fill_type, FillType::from_i64)
    }

    pub fn pattern_kind(&self) -> Option<PatternFillType> {
        tagged(&self.pattern_fill_type, PatternFillType::from_i64)
    }
}

record! {
    pub struct Border {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        color: Color,
        fill_type: Number,
        gradient: Gradient,
        is_enabled: bool,
        position: Number,
        thickness: Number,
    }
}

impl Border {
    pub fn kind(&self) -> Option<FillType> {
        tagged(&self.fill_type, FillType::from_i64)
    }

    pub fn placement(&self) -> Option<BorderPosition> {
        tagged(&self.position, BorderPosition::from_i64)
    }
}

record! {
    pub struct BorderOptions {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        dash_pattern: Vec<Number>,
        is_enabled: bool,
        line_cap_style: Number,
        line_join_style: Number,
    }
}

impl BorderOptions {
    pub fn line_cap(&self) -> Option<LineCapStyle> {
        tagged(&self.line_cap_style, LineCapStyle::from_i64)
    }

    pub fn line_join(&self) -> Option<LineJoinStyle> {
        tagged(&self.line_join_style, LineJoinStyle::from_i64)
    }
}

record! {
    pub struct Blur {
        #[serde(rename = "_class")]
        class: String,
        center: Point,
        is_enabled: bool,
        motion_angle: Number,
        radius: Number,
        #[serde(rename = "type")]
        blur_type: Number,
    }
}

record! {
    pub struct Gradient {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        elipse_length: Number,
        from: Point,
        gradient_type: Number,
        should_smoothen_opacity: bool,
        stops: Vec<GradientStop>,
        to: Point,
    }
}

record! {
    pub struct GradientStop {
        #[serde(rename = "_class")]
        class: String,
        #[serde(rename = "do_objectID")]
        object_id: String,
        color: Color,
        position: Number,
    }
}

record! {
    pub struct TextStyle {
        #[serde(rename = "_class")]
        class: String,
        encoded_attributes: EncodedAttributes,
        vertical_alignment: Number,
    }
}

record! {
    /// Text attributes as written by the authoring tool; several hold
    /// embedded archives.
    pub struct EncodedAttributes {
        #[serde(rename = "NSKern")]
        kern: Number,
        #[serde(rename = "NSStrokeWidth")]
        stroke_width: Number,
        #[serde(rename = "NSStrokeColor")]
        stroke_color: ArchivedAttributedString,
        #[serde(rename = "NSStrikethrough")]
        strikethrough: Number,
        #[serde(rename = "NSUnderline")]
        underline: Number,
        #[serde(rename = "MSAttributedStringFontAttribute")]
        font: ArchivedAttributedString,
        #[serde(rename = "MSAttributedStringTextTransformAttribute")]
        text_transform: Number,
        #[serde(rename = "NSColor")]
        color: ArchivedAttributedString,
        #[serde(rename = "NSParagraphStyle")]
        paragraph_style: ArchivedAttributedString,
    }
}

record! {
    /// Wrapper object around an embedded archive.
    pub struct ArchivedAttributedString {
        #[serde(rename = "_archive")]
        archive: Archive,
    }
}

impl ArchivedAttributedString {
    /// The plain text of an archived attributed string.
    ///
    /// Follows `$top.root` and reads its `NSString` (or `NS.string`)
    /// member, resolving references along the way.
    pub fn plain_text(&self) -> Option<&str> {
        let archive = self.archive.as_ref()?;
        let root = archive.top("root")?;
        let string = root.get("NSString").or_else(|| root.get("NS.string"))?;
        let string = archive.resolve(string);
        string
            .as_str()
            .or_else(|| archive.resolve(string.get("NS.string")?).as_str())
    }
}
