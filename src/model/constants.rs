option_enum! {
    /// How a layer reacts when its parent is resized.
    pub enum ResizingType {
        Stretch = 0,
        PinToCorner = 1,
        ResizeObject = 2,
        FloatInPlace = 3,
    }
}

option_enum! {
    pub enum LayerListExpandedType {
        Collapsed = 0,
        ExpandedTemp = 1,
        Expanded = 2,
    }
}

option_enum! {
    pub enum BorderPosition {
        Center = 0,
        Inside = 1,
        Outside = 2,
        Both = 3,
    }
}

option_enum! {
    pub enum LineCapStyle {
        Butt = 0,
        Round = 1,
        Square = 2,
    }
}

option_enum! {
    pub enum LineJoinStyle {
        Miter = 0,
        Round = 1,
        Bevel = 2,
    }
}

option_enum! {
    pub enum FillType {
        Solid = 0,
        Gradient = 1,
        Pattern = 4,
        Noise = 5,
    }
}

option_enum! {
    pub enum PatternFillType {
        Tile = 0,
        Fill = 1,
        Stretch = 2,
        Fit = 3,
    }
}

option_enum! {
    pub enum BlendMode {
        Normal = 0,
        Darken = 1,
        Multiply = 2,
        ColorBurn = 3,
        Lighten = 4,
        Screen = 5,
        ColorDodge = 6,
        Overlay = 7,
        SoftLight = 8,
        HardLight = 9,
        Difference = 10,
        Exclusion = 11,
        Hue = 12,
        Saturation = 13,
        Color = 14,
        Luminosity = 15,
    }
}

option_enum! {
    /// Arrow heads and other decorations at the ends of open paths.
    pub enum LineDecorationType {
        None = 0,
        OpenArrow = 1,
        ClosedArrow = 2,
        Bar = 3,
    }
}

option_enum! {
    pub enum BooleanOperation {
        None = -1,
        Union = 0,
        Subtract = 1,
        Intersect = 2,
        Difference = 3,
    }
}

option_enum! {
    pub enum CurveMode {
        None = 0,
        Straight = 1,
        Mirrored = 2,
        Disconnected = 3,
        Asymmetric = 4,
    }
}
