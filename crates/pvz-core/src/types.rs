//! # Domain Types
//!
//! Core domain types used throughout the PVZ backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Point       │   │   Reception     │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  point_id (FK)  │◄──│  reception_id   │       │
//! │  │  city           │   │  status         │   │  product_type   │       │
//! │  │  created_at     │   │  created_at     │   │  created_at     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ ReceptionStatus │   │  ProductType    │   │   UserRole      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  InProgress     │   │  Electronics    │   │  Moderator      │       │
//! │  │  Closed         │   │  Clothes        │   │  Employee       │       │
//! │  └─────────────────┘   │  Shoes          │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reception Lifecycle
//! ```text
//!   (none) ──open──► InProgress ──close──► Closed ──open──► InProgress ...
//!                        │  ▲
//!                 add ───┘  └─── delete last
//! ```
//! `Closed` is terminal for a given reception; a point moves on by opening a
//! new one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// =============================================================================
// Point
// =============================================================================

/// A pickup point. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Point {
    pub id: Uuid,
    /// One of the cities in the `cities` reference table.
    pub city: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Reception Status
// =============================================================================

/// The status of a reception (intake session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ReceptionStatus {
    /// Products may be added and withdrawn.
    InProgress,
    /// Terminal.
    Closed,
}

impl ReceptionStatus {
    /// Storage/wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReceptionStatus::InProgress => "in_progress",
            ReceptionStatus::Closed => "closed",
        }
    }

    /// Whether a point whose latest reception has this status may open a new one.
    #[inline]
    pub const fn allows_new_reception(&self) -> bool {
        matches!(self, ReceptionStatus::Closed)
    }

    /// Whether products may be added to or withdrawn from a reception in this status.
    #[inline]
    pub const fn accepts_products(&self) -> bool {
        matches!(self, ReceptionStatus::InProgress)
    }

    /// Status of the latest reception, where a point with no receptions
    /// behaves exactly like one whose latest reception is closed.
    #[inline]
    pub fn effective(latest: Option<ReceptionStatus>) -> ReceptionStatus {
        latest.unwrap_or(ReceptionStatus::Closed)
    }
}

impl fmt::Display for ReceptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Reception
// =============================================================================

/// An intake session at a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Reception {
    pub id: Uuid,
    pub point_id: Uuid,
    pub status: ReceptionStatus,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product Type
// =============================================================================

/// Kind of item accepted into a reception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Electronics,
    Clothes,
    Shoes,
}

impl ProductType {
    pub const ALL: [ProductType; 3] = [
        ProductType::Electronics,
        ProductType::Clothes,
        ProductType::Shoes,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductType::Electronics => "electronics",
            ProductType::Clothes => "clothes",
            ProductType::Shoes => "shoes",
        }
    }

    /// Label used on the public API (Russian).
    pub const fn label(&self) -> &'static str {
        match self {
            ProductType::Electronics => "электроника",
            ProductType::Clothes => "одежда",
            ProductType::Shoes => "обувь",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts both the storage names and the Russian API labels.
impl FromStr for ProductType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ProductType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s) || t.label() == s.to_lowercase())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: ProductType::ALL
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Product
// =============================================================================

/// An item accepted into a reception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    pub reception_id: Uuid,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub product_type: ProductType,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// User Role
// =============================================================================

/// Role carried in access tokens. Gates which operations a caller may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Moderator,
    Employee,
}

impl UserRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserRole::Moderator => "moderator",
            UserRole::Employee => "employee",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "moderator" => Ok(UserRole::Moderator),
            "employee" => Ok(UserRole::Employee),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["moderator".to_string(), "employee".to_string()],
            }),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account.
///
/// `refresh_token` holds the single currently valid refresh token; `None`
/// after logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Full-Info Listing
// =============================================================================

/// A reception with its products in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceptionWithProducts {
    pub reception: Reception,
    pub products: Vec<Product>,
}

/// A point with all its receptions (insertion order), each with products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointFullInfo {
    pub point: Point,
    pub receptions: Vec<ReceptionWithProducts>,
}

// =============================================================================
// Listing Filter
// =============================================================================

/// Window and page for point listings.
///
/// When `start` or `end` is set, only receptions created inside the inclusive
/// window are listed, and points without any such reception are omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl PointFilter {
    /// Whether a reception-date window is applied.
    #[inline]
    pub fn has_window(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Row offset of the first point on this page.
    #[inline]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for PointFilter {
    fn default() -> Self {
        PointFilter {
            start: None,
            end: None,
            page: 1,
            limit: crate::DEFAULT_PAGE_LIMIT,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
