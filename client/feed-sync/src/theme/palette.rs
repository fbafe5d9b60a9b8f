use super::ThemeName;

/// Colour tokens consumed by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: &'static str,
    pub card: &'static str,
    pub text: &'static str,
    pub muted_text: &'static str,
    pub border: &'static str,
    pub primary: &'static str,
    pub primary_text: &'static str,
    pub danger: &'static str,
    pub tab_icon: &'static str,
}

impl ThemeName {
    pub fn palette(&self) -> Palette {
        match self {
            ThemeName::SystemLight => Palette {
                bg: "#FFFFFF",
                card: "#F6F7F9",
                text: "#111827",
                muted_text: "#6B7280",
                border: "#E5E7EB",
                primary: "#0e56f0",
                primary_text: "#FFFFFF",
                danger: "#DC2626",
                tab_icon: "#111827",
            },
            ThemeName::SystemDark => Palette {
                bg: "#0F172A",
                card: "#1E293B",
                text: "#F1F5F9",
                muted_text: "#94A3B8",
                border: "#2A3448",
                primary: "#094ad4",
                primary_text: "#FFFFFF",
                danger: "#EF4444",
                tab_icon: "#CBD5E1",
            },
            ThemeName::FreshMint => Palette {
                bg: "#F2FBF8",
                card: "#FFFFFF",
                text: "#0F2E24",
                muted_text: "#6eb69f",
                border: "#D7EDE6",
                primary: "#10B981",
                primary_text: "#FFFFFF",
                danger: "#DC2626",
                tab_icon: "#6BAF9E",
            },
            ThemeName::FineRoyal => Palette {
                bg: "#0B0B0D",
                card: "#141418",
                text: "#F5F5F5",
                muted_text: "#A3A3A3",
                border: "#2A2A33",
                primary: "#D4AF37",
                primary_text: "#0B0B0D",
                danger: "#EF4444",
                tab_icon: "#E11D48",
            },
            ThemeName::PurpleHaze => Palette {
                bg: "#0A0612",
                card: "#140B23",
                text: "#F4EFFF",
                muted_text: "#C7B7E8",
                border: "#2A1744",
                primary: "#EC4899",
                primary_text: "#12061F",
                danger: "#FB7185",
                tab_icon: "#A855F7",
            },
            ThemeName::HackTheSystem => Palette {
                bg: "#050806",
                card: "#0B120D",
                text: "#D1FAE5",
                muted_text: "#86EFAC",
                border: "#12301E",
                primary: "#22C55E",
                primary_text: "#041008",
                danger: "#F87171",
                tab_icon: "#22C55E",
            },
        }
    }
}
