//! Visual theming for the graph canvases.
//!
//! Category colours, emphasis styles for the viewer and the lighter card
//! palette the builder uses.

use crate::flow::FlowNodeKind;
use crate::graph::{Category, Emphasis};

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Alpha, 0.0 to 1.0.
	pub a: f64,
}

impl Color {
	/// Opaque colour.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// `0xRRGGBB`.
	pub const fn hex(rgb: u32) -> Self {
		Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
	}

	/// Same colour with alpha `a`.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// CSS colour string: `#rrggbb` when opaque, `rgba(...)` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Colours of one category in the viewer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CategoryStyle {
	/// Left accent bar and legend dot.
	pub accent: Color,
	/// Card border.
	pub border: Color,
}

/// Resolved colours for drawing one viewer node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodePaint {
	/// Card fill.
	pub background: Color,
	/// Card border.
	pub border: Color,
	/// Left accent bar.
	pub accent: Color,
	/// Label colour.
	pub text: Color,
	/// Global alpha for the whole card.
	pub opacity: f64,
	/// Whether a drop shadow is drawn.
	pub shadow: bool,
}

/// Resolved stroke for one edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgePaint {
	/// Stroke and arrow colour.
	pub color: Color,
	/// Line width, canvas units.
	pub width: f64,
	/// Stroke alpha.
	pub opacity: f64,
}

/// Colours of one builder card.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardPaint {
	/// Card fill.
	pub background: Color,
	/// Card border.
	pub border: Color,
	/// Label colour.
	pub text: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Canvas fill.
	pub background: Color,
	/// Dot grid colour.
	pub grid_dot: Color,
	/// Dot spacing, canvas units.
	pub grid_gap: f64,
	/// Fill of viewer nodes that are not dimmed.
	pub node_background: Color,
	/// Label colour of viewer nodes that are not dimmed.
	pub node_text: Color,
	/// Card corner radius.
	pub corner_radius: f64,
	/// Width of the viewer's category accent bar.
	pub accent_width: f64,
	/// CSS font for labels.
	pub font: &'static str,
	/// Paint for nodes outside the selection.
	pub dimmed: NodePaint,
	/// Edges with no selection active.
	pub edge: EdgePaint,
	/// Edges touching the selected node.
	pub edge_emphasized: EdgePaint,
	/// Edges outside the selection.
	pub edge_dimmed: EdgePaint,
	/// Dash and gap length of emphasized edges, in canvas units.
	pub flow_dash: [f64; 2],
	/// How fast the dashes travel towards the target, canvas units per second.
	pub flow_speed: f64,
	/// Outline of the selected node.
	pub selection: Color,
	/// Builder connectors and edges.
	pub connector: Color,
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: Color::hex(0xf9fafb),
			grid_dot: Color::hex(0xcbd5e1),
			grid_gap: 40.0,
			node_background: Color::hex(0xffffff),
			node_text: Color::hex(0x1e293b),
			corner_radius: 12.0,
			accent_width: 6.0,
			font: "500 13px system-ui, sans-serif",
			dimmed: NodePaint {
				background: Color::hex(0xf8fafc),
				border: Color::hex(0xe2e8f0),
				accent: Color::hex(0xcbd5e1),
				text: Color::hex(0x94a3b8),
				opacity: 0.4,
				shadow: false,
			},
			edge: EdgePaint {
				color: Color::hex(0xcbd5e1),
				width: 1.5,
				opacity: 1.0,
			},
			edge_emphasized: EdgePaint {
				color: Color::hex(0x2563eb),
				width: 3.0,
				opacity: 1.0,
			},
			edge_dimmed: EdgePaint {
				color: Color::hex(0xe2e8f0),
				width: 1.5,
				opacity: 0.3,
			},
			flow_dash: [8.0, 6.0],
			flow_speed: 40.0,
			selection: Color::hex(0x2563eb),
			connector: Color::hex(0x64748b),
		}
	}
}

impl Theme {
	/// Accent and border of `category`.
	pub fn category(&self, category: Category) -> CategoryStyle {
		let (accent, border) = match category {
			Category::Controller => (0x2563eb, 0x1d4ed8),
			Category::Service => (0x7c3aed, 0x6d28d9),
			Category::Repository => (0xea580c, 0xc2410c),
			Category::Entity => (0x059669, 0x047857),
			Category::Config => (0x475569, 0x334155),
			Category::Other => (0x52525b, 0x3f3f46),
		};
		CategoryStyle {
			accent: Color::hex(accent),
			border: Color::hex(border),
		}
	}

	/// Paint for a viewer node.
	pub fn node(&self, category: Category, emphasis: Emphasis) -> NodePaint {
		if emphasis.is_dimmed() {
			return self.dimmed;
		}
		let style = self.category(category);
		NodePaint {
			background: self.node_background,
			border: style.border,
			accent: style.accent,
			text: self.node_text,
			opacity: 1.0,
			shadow: true,
		}
	}

	/// Stroke for a viewer edge.
	pub fn edge(&self, emphasis: Emphasis) -> EdgePaint {
		match emphasis {
			Emphasis::Normal => self.edge,
			Emphasis::Emphasized => self.edge_emphasized,
			Emphasis::Dimmed => self.edge_dimmed,
		}
	}

	/// Line dash offset of emphasized edges `elapsed_ms` into the animation.
	/// Always within one dash period, negative so dashes run source to target.
	pub fn flow_offset(&self, elapsed_ms: f64) -> f64 {
		let period = self.flow_dash[0] + self.flow_dash[1];
		if period <= 0.0 {
			return 0.0;
		}
		-((elapsed_ms / 1000.0 * self.flow_speed).rem_euclid(period))
	}

	/// Paint for a builder card.
	pub fn card(&self, kind: FlowNodeKind) -> CardPaint {
		let (background, border, text) = match kind {
			FlowNodeKind::Note => (0xfef3c7, 0xd97706, 0x92400e),
			FlowNodeKind::Component(Category::Controller) => (0xeff6ff, 0x2563eb, 0x1e40af),
			FlowNodeKind::Component(Category::Service) => (0xf5f3ff, 0x7c3aed, 0x5b21b6),
			FlowNodeKind::Component(Category::Repository) => (0xfff7ed, 0xea580c, 0x9a3412),
			FlowNodeKind::Component(Category::Entity) => (0xecfdf5, 0x059669, 0x065f46),
			FlowNodeKind::Component(_) => (0xffffff, 0x777777, 0x333333),
		};
		CardPaint {
			background: Color::hex(background),
			border: Color::hex(border),
			text: Color::hex(text),
		}
	}
}
