//! Decoders for ENTSO-E transparency-platform publication documents.
//!
//! Three document families are decoded into typed records: day-ahead
//! prices (A44, `Publication_MarketDocument`), aggregated generation per
//! type (A75, `GL_MarketDocument`), and cross-border physical flows (A11).
//! Each `TimeSeries`/`Period` pair in a document becomes one record;
//! multiple periods are emitted in document order. Network fetching is out
//! of scope here; callers hand in XML text read from the source archive.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::{events::Event, name::LocalName, Reader};
use serde::{Deserialize, Serialize};

/// Native step length of a decoded period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "PT60M")]
    Pt60M,
    #[serde(rename = "PT15M")]
    Pt15M,
}

impl Resolution {
    pub fn steps_per_hour(self) -> usize {
        match self {
            Resolution::Pt60M => 1,
            Resolution::Pt15M => 4,
        }
    }

    pub fn step_minutes(self) -> i64 {
        match self {
            Resolution::Pt60M => 60,
            Resolution::Pt15M => 15,
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        match text.trim() {
            "PT60M" | "PT1H" => Ok(Resolution::Pt60M),
            "PT15M" => Ok(Resolution::Pt15M),
            other => Err(anyhow!("unsupported resolution '{other}'")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Pt60M => "PT60M",
            Resolution::Pt15M => "PT15M",
        }
    }
}

/// One 1-based point of a day-ahead price period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub position: u32,
    pub price_eur_mwh: f64,
}

/// One 1-based point carrying a MW quantity (generation or flow).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityPoint {
    pub position: u32,
    pub quantity_mw: f64,
}

/// A decoded day-ahead price period for one zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub zone_code: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub resolution: Resolution,
    pub prices: Vec<PricePoint>,
}

/// A decoded aggregated-generation period for one zone and PSR type.
///
/// `in_domain` is true when the series carries an in-bidding-zone domain
/// mRID; consumption/pumping series carry only an out-domain mRID and are
/// excluded by the canonicalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSeries {
    pub zone_code: String,
    pub psr_type: String,
    pub in_domain: bool,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub resolution: Resolution,
    pub points: Vec<QuantityPoint>,
}

/// A decoded cross-border flow period for one directed interconnection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSeries {
    pub in_zone: String,
    pub out_zone: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub resolution: Resolution,
    pub points: Vec<QuantityPoint>,
}

/// EIC area codes for the zones this methodology covers and their
/// interconnected neighbours. Unknown mRIDs pass through verbatim so that
/// fixture documents can use plain zone codes.
const EIC_ZONES: &[(&str, &str)] = &[
    ("10Y1001A1001A44P", "SE1"),
    ("10Y1001A1001A45N", "SE2"),
    ("10Y1001A1001A46L", "SE3"),
    ("10Y1001A1001A47J", "SE4"),
    ("10YFI-1--------U", "FI"),
    ("10YDK-1--------W", "DK1"),
    ("10YDK-2--------M", "DK2"),
    ("10YNO-1--------2", "NO1"),
    ("10YNO-3--------J", "NO3"),
    ("10YNO-4--------9", "NO4"),
    ("10Y1001A1001A82H", "DE"),
    ("10YPL-AREA-----S", "PL"),
    ("10YLT-1001A0008Q", "LT"),
];

pub fn zone_from_mrid(mrid: &str) -> String {
    EIC_ZONES
        .iter()
        .find(|(eic, _)| *eic == mrid)
        .map(|(_, zone)| zone.to_string())
        .unwrap_or_else(|| mrid.to_string())
}

/// Internal accumulator for one `TimeSeries`/`Period` pair, shared by all
/// three document families.
#[derive(Debug, Default, Clone)]
struct RawPeriod {
    in_domain: Option<String>,
    out_domain: Option<String>,
    in_bidding_zone: Option<String>,
    out_bidding_zone: Option<String>,
    psr_type: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    resolution: Option<Resolution>,
    points: Vec<(u32, f64)>,
}

/// ENTSO-E interval instants come as `2024-01-01T00:00Z`; fixtures may use
/// full RFC 3339.
fn parse_instant(text: &str) -> Result<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%MZ")
        .with_context(|| format!("unparseable interval instant '{trimmed}'"))?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn local_name_as_str<'a>(name: &'a LocalName<'a>) -> &'a str {
    std::str::from_utf8(name.as_ref()).unwrap_or_default()
}

/// Event-driven walk over a publication document. Emits one `RawPeriod`
/// per `Period` element, carrying the domains and PSR type of the
/// enclosing `TimeSeries`.
fn parse_raw_periods(xml: &str) -> Result<Vec<RawPeriod>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut raws: Vec<RawPeriod> = Vec::new();
    let mut series = RawPeriod::default();
    let mut period: Option<RawPeriod> = None;
    let mut position: Option<u32> = None;
    let mut active_tag: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                let tag = local_name_as_str(&name);
                active_tag = Some(tag.to_string());
                match tag {
                    "TimeSeries" => series = RawPeriod::default(),
                    "Period" => {
                        let mut fresh = series.clone();
                        fresh.points.clear();
                        fresh.start = None;
                        fresh.end = None;
                        fresh.resolution = None;
                        period = Some(fresh);
                    }
                    "Point" => position = None,
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape()?.into_owned();
                let Some(tag) = active_tag.as_deref() else {
                    continue;
                };
                match tag {
                    "in_Domain.mRID" => series.in_domain = Some(text),
                    "out_Domain.mRID" => series.out_domain = Some(text),
                    "inBiddingZone_Domain.mRID" => series.in_bidding_zone = Some(text),
                    "outBiddingZone_Domain.mRID" => series.out_bidding_zone = Some(text),
                    "psrType" => series.psr_type = Some(text),
                    "start" => {
                        let instant = parse_instant(&text)?;
                        period.as_mut().unwrap_or(&mut series).start = Some(instant);
                    }
                    "end" => {
                        let instant = parse_instant(&text)?;
                        period.as_mut().unwrap_or(&mut series).end = Some(instant);
                    }
                    "resolution" => {
                        let parsed = Resolution::parse(&text)?;
                        period.as_mut().unwrap_or(&mut series).resolution = Some(parsed);
                    }
                    "position" => {
                        position = Some(text.trim().parse().with_context(|| {
                            format!("unparseable point position '{text}'")
                        })?)
                    }
                    "price.amount" | "quantity" => {
                        let value: f64 = text.trim().parse().with_context(|| {
                            format!("unparseable point value '{text}'")
                        })?;
                        let pos = position
                            .ok_or_else(|| anyhow!("point value before its position"))?;
                        if let Some(p) = period.as_mut() {
                            p.points.push((pos, value));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.local_name();
                if local_name_as_str(&name) == "Period" {
                    if let Some(mut done) = period.take() {
                        // Domains/PSR live on the TimeSeries, refreshed here in
                        // case they appeared after the first Period.
                        done.in_domain = series.in_domain.clone();
                        done.out_domain = series.out_domain.clone();
                        done.in_bidding_zone = series.in_bidding_zone.clone();
                        done.out_bidding_zone = series.out_bidding_zone.clone();
                        done.psr_type = series.psr_type.clone();
                        done.points.sort_by_key(|(pos, _)| *pos);
                        raws.push(done);
                    }
                }
                active_tag = None;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(anyhow!("XML parse error: {err}")),
            _ => {}
        }
    }
    Ok(raws)
}

fn require_interval(raw: &RawPeriod) -> Result<(DateTime<Utc>, DateTime<Utc>, Resolution)> {
    let start = raw.start.ok_or_else(|| anyhow!("period without start"))?;
    let end = raw.end.ok_or_else(|| anyhow!("period without end"))?;
    let resolution = raw
        .resolution
        .ok_or_else(|| anyhow!("period without resolution"))?;
    Ok((start, end, resolution))
}

/// Decode a day-ahead price document (A44).
pub fn parse_price_document(xml: &str) -> Result<Vec<PriceSeries>> {
    let mut out = Vec::new();
    for raw in parse_raw_periods(xml).context("decoding A44 price document")? {
        let (period_start, period_end, resolution) = require_interval(&raw)?;
        let mrid = raw
            .in_domain
            .clone()
            .or(raw.out_domain.clone())
            .ok_or_else(|| anyhow!("price series without a domain mRID"))?;
        out.push(PriceSeries {
            zone_code: zone_from_mrid(&mrid),
            period_start,
            period_end,
            resolution,
            prices: raw
                .points
                .iter()
                .map(|(position, value)| PricePoint {
                    position: *position,
                    price_eur_mwh: *value,
                })
                .collect(),
        });
    }
    Ok(out)
}

/// Decode an aggregated generation-per-type document (A75).
pub fn parse_generation_document(xml: &str) -> Result<Vec<GenerationSeries>> {
    let mut out = Vec::new();
    for raw in parse_raw_periods(xml).context("decoding A75 generation document")? {
        let (period_start, period_end, resolution) = require_interval(&raw)?;
        let psr_type = raw
            .psr_type
            .clone()
            .ok_or_else(|| anyhow!("generation series without psrType"))?;
        let in_domain = raw.in_bidding_zone.is_some();
        let mrid = raw
            .in_bidding_zone
            .clone()
            .or(raw.out_bidding_zone.clone())
            .ok_or_else(|| anyhow!("generation series without a bidding-zone mRID"))?;
        out.push(GenerationSeries {
            zone_code: zone_from_mrid(&mrid),
            psr_type,
            in_domain,
            period_start,
            period_end,
            resolution,
            points: raw
                .points
                .iter()
                .map(|(position, value)| QuantityPoint {
                    position: *position,
                    quantity_mw: *value,
                })
                .collect(),
        });
    }
    Ok(out)
}

/// Decode a cross-border physical-flow document (A11). Direction is
/// in-zone receiving, out-zone sending.
pub fn parse_flow_document(xml: &str) -> Result<Vec<FlowSeries>> {
    let mut out = Vec::new();
    for raw in parse_raw_periods(xml).context("decoding A11 flow document")? {
        let (period_start, period_end, resolution) = require_interval(&raw)?;
        let in_mrid = raw
            .in_domain
            .clone()
            .ok_or_else(|| anyhow!("flow series without in_Domain"))?;
        let out_mrid = raw
            .out_domain
            .clone()
            .ok_or_else(|| anyhow!("flow series without out_Domain"))?;
        out.push(FlowSeries {
            in_zone: zone_from_mrid(&in_mrid),
            out_zone: zone_from_mrid(&out_mrid),
            period_start,
            period_end,
            resolution,
            points: raw
                .points
                .iter()
                .map(|(position, value)| QuantityPoint {
                    position: *position,
                    quantity_mw: *value,
                })
                .collect(),
        });
    }
    Ok(out)
}

impl PriceSeries {
    /// Timestamp of a 1-based point position.
    pub fn timestamp_of(&self, position: u32) -> DateTime<Utc> {
        self.period_start
            + chrono::Duration::minutes(self.resolution.step_minutes() * (position as i64 - 1))
    }
}

impl FlowSeries {
    pub fn timestamp_of(&self, position: u32) -> DateTime<Utc> {
        self.period_start
            + chrono::Duration::minutes(self.resolution.step_minutes() * (position as i64 - 1))
    }

    /// Border key irrespective of direction, e.g. `SE3-NO1`.
    pub fn border(&self) -> String {
        let mut pair = [self.in_zone.as_str(), self.out_zone.as_str()];
        pair.sort();
        format!("{}-{}", pair[0], pair[1])
    }
}

impl GenerationSeries {
    pub fn timestamp_of(&self, position: u32) -> DateTime<Utc> {
        self.period_start
            + chrono::Duration::minutes(self.resolution.step_minutes() * (position as i64 - 1))
    }
}
