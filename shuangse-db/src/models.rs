use thiserror::Error;

pub const RED_MAX: u8 = 33;
pub const BLUE_MAX: u8 = 16;
pub const RED_COUNT: usize = 6;

/// Erreur de validation d'une combinaison (tirage ou grille).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("{got} boules rouges fournies, 6 attendues")]
    WrongRedCount { got: usize },
    #[error("boule rouge {0} hors limites (1-33)")]
    RedOutOfRange(u8),
    #[error("boule bleue {0} hors limites (1-16)")]
    BlueOutOfRange(u8),
    #[error("boule rouge en double : {0}")]
    DuplicateRed(u8),
    #[error("identifiant de tirage invalide : '{0}'")]
    InvalidDrawId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub draw_id: String,
    pub date: String,
    /// Toujours triées par ordre croissant.
    pub reds: [u8; RED_COUNT],
    pub blue: u8,
}

impl DrawRecord {
    /// Construit un tirage validé ; les boules rouges sont triées.
    pub fn new(draw_id: &str, date: &str, reds: &[u8], blue: u8) -> Result<Self, NumberError> {
        parse_draw_number(draw_id)?;
        let reds = validate_numbers(reds, blue)?;
        Ok(Self {
            draw_id: draw_id.trim().to_string(),
            date: date.to_string(),
            reds,
            blue,
        })
    }

    /// Numéro de tirage en entier (l'identifiant est validé à l'ingestion).
    pub fn draw_number(&self) -> u64 {
        self.draw_id.parse().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub reds: [u8; RED_COUNT],
    pub blue: u8,
}

impl Candidate {
    pub fn new(reds: &[u8], blue: u8) -> Result<Self, NumberError> {
        let reds = validate_numbers(reds, blue)?;
        Ok(Self { reds, blue })
    }

    pub fn red_hits(&self, draw: &DrawRecord) -> usize {
        self.reds.iter().filter(|r| draw.reds.contains(r)).count()
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} + {:02}", format_reds(&self.reds), self.blue)
    }
}

pub fn format_reds(reds: &[u8]) -> String {
    reds.iter()
        .map(|r| format!("{:02}", r))
        .collect::<Vec<_>>()
        .join(" - ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Red,
    Blue,
}

impl Pool {
    pub fn size(&self) -> usize {
        match self {
            Pool::Red => RED_MAX as usize,
            Pool::Blue => BLUE_MAX as usize,
        }
    }

    pub fn numbers_from<'a>(&self, draw: &'a DrawRecord) -> &'a [u8] {
        match self {
            Pool::Red => &draw.reds,
            Pool::Blue => std::slice::from_ref(&draw.blue),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionKind {
    Random,
    Analysis,
}

impl PredictionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionKind::Random => "random",
            PredictionKind::Analysis => "analysis",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "random" => Some(PredictionKind::Random),
            "analysis" => Some(PredictionKind::Analysis),
            _ => None,
        }
    }
}

impl std::fmt::Display for PredictionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionKind::Random => write!(f, "Aléatoire"),
            PredictionKind::Analysis => write!(f, "Analyse"),
        }
    }
}

/// Grille enregistrée pour un tirage futur, et son résultat une fois le tirage connu.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub id: i64,
    pub draw_id: String,
    pub candidate: Candidate,
    pub kind: PredictionKind,
    /// Scores par dimension (hot_cold, missing, interval, odd_even, zone), analyses seulement.
    pub scores: Option<[f64; 5]>,
    pub total_score: Option<f64>,
    pub created_at: String,
    pub hit_count: u8,
    pub blue_hit: bool,
    pub prize_tier: Option<u8>,
    pub is_hit: bool,
    pub checked_at: Option<String>,
}

impl Prediction {
    pub fn new(draw_id: &str, candidate: Candidate, kind: PredictionKind) -> Self {
        Self {
            id: 0,
            draw_id: draw_id.to_string(),
            candidate,
            kind,
            scores: None,
            total_score: None,
            created_at: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
            hit_count: 0,
            blue_hit: false,
            prize_tier: None,
            is_hit: false,
            checked_at: None,
        }
    }

    pub fn with_scores(mut self, scores: [f64; 5], total: f64) -> Self {
        self.scores = Some(scores);
        self.total_score = Some(total);
        self
    }

    /// Vrai si le tirage visé est déjà passé au regard du dernier tirage connu.
    pub fn is_drawn(&self, latest_draw_id: Option<&str>) -> bool {
        match (latest_draw_id, self.draw_id.parse::<u64>()) {
            (Some(latest), Ok(own)) => latest.parse::<u64>().map(|l| own <= l).unwrap_or(false),
            _ => false,
        }
    }
}

pub fn parse_draw_number(draw_id: &str) -> Result<u64, NumberError> {
    let trimmed = draw_id.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(NumberError::InvalidDrawId(draw_id.to_string()));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| NumberError::InvalidDrawId(draw_id.to_string()))
}

/// Vérifie 6 rouges distinctes dans [1,33] et une bleue dans [1,16] ; renvoie les rouges triées.
pub fn validate_numbers(reds: &[u8], blue: u8) -> Result<[u8; RED_COUNT], NumberError> {
    if reds.len() != RED_COUNT {
        return Err(NumberError::WrongRedCount { got: reds.len() });
    }
    for &r in reds {
        if r < 1 || r > RED_MAX {
            return Err(NumberError::RedOutOfRange(r));
        }
    }
    if blue < 1 || blue > BLUE_MAX {
        return Err(NumberError::BlueOutOfRange(blue));
    }
    let mut sorted = [0u8; RED_COUNT];
    sorted.copy_from_slice(reds);
    sorted.sort();
    for pair in sorted.windows(2) {
        if pair[0] == pair[1] {
            return Err(NumberError::DuplicateRed(pair[0]));
        }
    }
    Ok(sorted)
}
