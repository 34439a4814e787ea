pub mod design;
pub mod geometry;
pub mod hold;
pub mod instance;
pub mod price_tier;
pub mod seat;
pub mod seat_view;

pub use design::{DesignRow, DesignSeat, DesignSection, DesignStatus, SeatingDesign};
pub use geometry::{GeometryRow, GeometrySeat, GeometrySection, GeometrySnapshot};
pub use hold::SeatHold;
pub use instance::{EventSeatingInstance, InstanceStatus};
pub use price_tier::PriceTier;
pub use seat::{NewSeat, Seat, SeatStatus};
pub use seat_view::{RowView, SeatAvailability, SeatMapView, SeatView, SectionView};
