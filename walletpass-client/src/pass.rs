// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Pass categories and the resources the wallet server exposes for each.

/// Category of a pass, selecting the API collection it lives in.
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassCategory {
    /// Event tickets, e.g. concerts.
    #[strum(to_string = "eventticket")]
    EventTicket,
    /// Boarding passes.
    #[strum(to_string = "flight")]
    Flight,
    /// Gift cards.
    #[strum(to_string = "giftcard")]
    GiftCard,
    /// Loyalty cards.
    #[strum(to_string = "loyalty")]
    Loyalty,
    /// Coupons and offers.
    #[strum(to_string = "offer")]
    Offer,
    /// Transit tickets.
    #[strum(to_string = "transit")]
    Transit,
}

/// A pass resource: the style template or a concrete per-user pass.
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassResource {
    /// The template shared by all passes of one style.
    #[strum(to_string = "model")]
    Model,
    /// A concrete pass held by one user.
    #[strum(to_string = "instance")]
    Instance,
}

impl PassCategory {
    /// All categories.
    pub const ALL: [PassCategory; 6] = [
        PassCategory::EventTicket,
        PassCategory::Flight,
        PassCategory::GiftCard,
        PassCategory::Loyalty,
        PassCategory::Offer,
        PassCategory::Transit,
    ];
}
