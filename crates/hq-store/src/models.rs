/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{bars, sync_log};
use hq_models::{Bar, SyncState};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = bars)]
#[diesel(primary_key(symbol, date))]
pub struct BarRow {
  pub symbol: String,
  pub date: NaiveDate,
  pub open: f64,
  pub high: f64,
  pub low: f64,
  pub close: f64,
  pub volume: f64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = bars)]
pub struct NewBarRow {
  pub symbol: String,
  pub date: NaiveDate,
  pub open: f64,
  pub high: f64,
  pub low: f64,
  pub close: f64,
  pub volume: f64,
}

impl From<BarRow> for Bar {
  fn from(row: BarRow) -> Self {
    Bar {
      symbol: row.symbol,
      date: row.date,
      open: row.open,
      high: row.high,
      low: row.low,
      close: row.close,
      volume: row.volume,
    }
  }
}

impl From<&Bar> for NewBarRow {
  fn from(bar: &Bar) -> Self {
    NewBarRow {
      symbol: bar.symbol.clone(),
      date: bar.date,
      open: bar.open,
      high: bar.high,
      low: bar.low,
      close: bar.close,
      volume: bar.volume,
    }
  }
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = sync_log)]
pub struct SyncLogRow {
  pub symbol: String,
  pub last_sync_at: NaiveDateTime,
  pub first_bar_date: Option<NaiveDate>,
  pub last_bar_date: Option<NaiveDate>,
  pub bar_count: i64,
  pub full_history_completed: bool,
}

impl From<SyncLogRow> for SyncState {
  fn from(row: SyncLogRow) -> Self {
    SyncState {
      symbol: row.symbol,
      last_sync_at: row.last_sync_at,
      first_bar_date: row.first_bar_date,
      last_bar_date: row.last_bar_date,
      bar_count: row.bar_count,
      full_history_completed: row.full_history_completed,
    }
  }
}
