use std::env;

use serde::Deserialize;

use crate::models::RoomLayout;

// Top-level configuration container, read once at startup by the binary.
// The library itself never touches the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub room: RoomConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

/// Geometry and pricing of the single screening room. Every screening
/// created by this instance uses this layout.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomConfig {
    pub seats_per_row: u32,
    pub total_seats: u32,
    pub seat_price_pence: u32,
}

impl RoomConfig {
    pub fn layout(&self) -> RoomLayout {
        RoomLayout::new(self.seats_per_row, self.total_seats)
    }

    /// Row letters run A..Z, so the layout caps out at 26 rows.
    pub fn validate(&self) -> Result<(), String> {
        if self.seats_per_row == 0 {
            return Err("ROOM_SEATS_PER_ROW must be at least 1".to_string());
        }
        if self.total_seats == 0 {
            return Err("ROOM_TOTAL_SEATS must be at least 1".to_string());
        }
        let rows = self.total_seats.div_ceil(self.seats_per_row);
        if rows > 26 {
            return Err(format!(
                "room layout needs {rows} rows, the maximum is 26 (A-Z)"
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Self {
        let config = Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .expect("PORT must be a valid number"),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "cinema_system=debug,tower_http=debug".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
                pool_size: env::var("DB_POOL_SIZE")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("DB_POOL_SIZE must be a valid number"),
            },
            room: RoomConfig {
                seats_per_row: env::var("ROOM_SEATS_PER_ROW")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .expect("ROOM_SEATS_PER_ROW must be a valid number"),
                total_seats: env::var("ROOM_TOTAL_SEATS")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()
                    .expect("ROOM_TOTAL_SEATS must be a valid number"),
                seat_price_pence: env::var("SEAT_PRICE_PENCE")
                    .unwrap_or_else(|_| "800".to_string())
                    .parse()
                    .expect("SEAT_PRICE_PENCE must be a valid number"),
            },
        };
        if let Err(reason) = config.room.validate() {
            panic!("invalid room configuration: {reason}");
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(seats_per_row: u32, total_seats: u32) -> RoomConfig {
        RoomConfig { seats_per_row, total_seats, seat_price_pence: 800 }
    }

    #[test]
    fn default_room_shape_is_valid() {
        assert!(room(10, 50).validate().is_ok());
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(room(0, 50).validate().is_err());
        assert!(room(10, 0).validate().is_err());
    }

    #[test]
    fn rows_stop_at_the_alphabet() {
        // 26 rows of 2 is the last valid shape, 27 rows is not.
        assert!(room(2, 52).validate().is_ok());
        assert!(room(2, 53).validate().is_err());
        assert!(room(1, 27).validate().is_err());
    }
}
