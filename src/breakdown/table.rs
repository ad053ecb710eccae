//! Breakdown table

use std::io;

use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};

use super::{Breakdown, BreakdownError};

impl Breakdown {
    /// Write the breakdown as a human-readable table followed by the order totals.
    ///
    /// # Errors
    ///
    /// Returns [`BreakdownError::IO`] if writing fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), BreakdownError> {
        write_lines_table(&mut out, self)?;

        if !self.free_items.is_empty() {
            write_free_items(&mut out, self)?;
        }

        write_summary(&mut out, self)?;

        if !self.skipped.is_empty() {
            write_skipped(&mut out, self)?;
        }

        Ok(())
    }
}

fn write_lines_table(out: &mut impl io::Write, breakdown: &Breakdown) -> Result<(), BreakdownError> {
    let mut builder = Builder::default();

    builder.push_record([
        "",
        "Item",
        "Qty",
        "Price",
        "Discount",
        "Final Price",
        "Promotions",
    ]);

    for (idx, line) in breakdown.lines.iter().enumerate() {
        let discounted = line.total_discount.to_minor_units() != 0;

        builder.push_record([
            format!("#{:<3}", idx + 1),
            line.name.clone(),
            line.quantity.to_string(),
            format!("{}", line.original_price),
            if discounted {
                format!("-{}", line.total_discount)
            } else {
                String::new()
            },
            format!("{}", line.final_price),
            line.applied_promotion_codes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        ]);
    }

    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..6), Alignment::right());

    writeln!(out, "\n{table}").map_err(|_err| BreakdownError::IO)
}

fn write_free_items(out: &mut impl io::Write, breakdown: &Breakdown) -> Result<(), BreakdownError> {
    writeln!(out, " Free items:").map_err(|_err| BreakdownError::IO)?;

    for item in &breakdown.free_items {
        writeln!(out, "   {} x {} ({})", item.quantity, item.name, item.reason)
            .map_err(|_err| BreakdownError::IO)?;
    }

    writeln!(out).map_err(|_err| BreakdownError::IO)
}

fn write_summary(out: &mut impl io::Write, breakdown: &Breakdown) -> Result<(), BreakdownError> {
    let mut rows: Vec<(String, String)> = vec![
        ("Subtotal:".to_string(), format!("{}", breakdown.original_total)),
        ("Discount:".to_string(), format!("-{}", breakdown.discount_total)),
        ("Total:".to_string(), format!("{}", breakdown.final_total)),
    ];

    for applied in &breakdown.applied_promotions {
        rows.push((format!("{}:", applied.code), format!("-{}", applied.discount)));
    }

    let benefits = &breakdown.benefits;

    if benefits.free_shipping {
        rows.push(("Shipping:".to_string(), "free".to_string()));
    }

    if benefits.loyalty_points > 0 {
        rows.push(("Points:".to_string(), benefits.loyalty_points.to_string()));
    }

    if benefits.gift_card.to_minor_units() > 0 {
        rows.push(("Gift card:".to_string(), format!("{}", benefits.gift_card)));
    }

    if benefits.cashback.to_minor_units() > 0 {
        rows.push(("Cashback:".to_string(), format!("{}", benefits.cashback)));
    }

    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

    for (label, value) in rows {
        writeln!(out, " {label:>label_width$}  {value:>value_width$}")
            .map_err(|_err| BreakdownError::IO)?;
    }

    writeln!(out).map_err(|_err| BreakdownError::IO)
}

fn write_skipped(out: &mut impl io::Write, breakdown: &Breakdown) -> Result<(), BreakdownError> {
    writeln!(out, " Not applied:").map_err(|_err| BreakdownError::IO)?;

    for skipped in &breakdown.skipped {
        writeln!(out, "   {} ({})", skipped.code, skipped.reason)
            .map_err(|_err| BreakdownError::IO)?;
    }

    writeln!(out).map_err(|_err| BreakdownError::IO)
}
