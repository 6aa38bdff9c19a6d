/*!

This is the long-form manual for `roster_stats` and `rosterstats`.

## Input layout

The roster is the first worksheet of an Excel workbook (`.xlsx`), or a CSV file with
the same layout. The first row is the header. Each following row is one sign-up of one
participant for one or more days:

| Column | Content |
|--------|---------|
| C | name, possibly followed by `형제` or `자매` |
| D | gender (`형제` or `자매`) |
| E | congregation |
| F | birth year |
| H | marital status (`기혼` or `미혼`) |
| K and after | one column per day of the campaign |

All these positions can be changed in the configuration file.

The header of a day column can be written in many ways:
* a date cell of the workbook
* `4/22` or `4-22`
* `4월 22일`, possibly followed by the weekday (`4월 22일 화요일`) and a note in
  parentheses (`5월 1일 목요일 (근로자의 날)`)
* `422` or `0422`

Only the days that fall in one of the months of the campaign are kept. Other columns
are ignored.

A participant attended a day when the cell holds `O`, `TRUE`, `Y`, `YES` or `1`
(in any case). Anything else, including an empty cell, means absent.

## Merging

The same person often appears on several rows, one per sign-up. Rows with the same
name, gender, congregation and birth year are merged into one participant; the days
are added together. The first day of a participant is the day of the leftmost column
among the days they attended.

Rows without a name are ignored, and so are participants who did not attend any day.

## Outputs

### CSV export

One line per participant:

```text
날짜,회중,이름,성별,나이,출생연도,결혼,참여일자
4월 22일,서울지회,홍길동,형제,35,1990,기혼,"4월 22일,4월 29일"
```

The age is computed from the reference year of the configuration (2025 by default),
never from the current date.

### Summary

The summary is a JSON document with the statistics of the campaign: gender, age
groups, marital status, number of days per participant, congregations, regions, the
calendar and the busiest days.

Congregations are listed twice. In `congregation` the rank is the position in the list:
two congregations with the same number of participants get different ranks. In
`congregationSharedRank` they share the same rank (1, 1, 3, ...).

## Configuration file

```json
{
  "outputSettings": {
    "campaignName": "서울성수 특별 캠페인",
    "outputDirectory": "output",
    "exportFile": "participants.csv",
    "summaryFile": "summary.json"
  },
  "source": {
    "provider": "xlsx",
    "filePath": "서울성수.xlsx",
    "nameColumnIndex": "C",
    "firstDateColumnIndex": "K"
  },
  "campaign": {
    "startDate": "2025-04-21",
    "endDate": "2025-05-18",
    "referenceYear": 2025
  }
}
```

The providers are `xlsx`, `csv` and `export` (a CSV export written by a previous run).
Without a provider, `.csv` files are read as CSV and all other files as workbooks.
Column indexes are either letters (`"C"`) or numbers starting at 1 (`3`).

An optional `rules` section changes the attendance markers (`attendanceMarkers`), the
honorific suffixes removed from the names (`honorificSuffixes`), the number of
congregations in the summary (`topCongregations`, 21 by default), the largest number of
days in the participation histogram (`maxParticipationDays`, 7 by default) and the
list of regions (`regions`).

`outputSettings.scheduleFile` points to a JSON object keyed by date (`2025-04-22`). Its
entries are copied into the calendar of the summary.

*/
