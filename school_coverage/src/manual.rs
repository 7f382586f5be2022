/*!

This is the long-form manual for `school_coverage` and `covreport`.

## Input format

The input is the `Consolidação` worksheet of an Excel (.xlsx) workbook.
The first row is a header, then one row per school. The columns are read
by position, not by name:

| column | content              | field          |
|--------|----------------------|----------------|
| A      | regional office      | `region`       |
| B      | municipality         | `municipality` |
| C      | (ignored)            |                |
| D      | INEP code            | `school_code`  |
| E      | school name          | `school_name`  |
| F      | testing date(s)      | `date_field`   |

Columns after F are ignored. If the same header label appears more than
once, only the first column with this label is kept before the positions
are applied. A sheet with fewer than 6 distinct columns is rejected.

Every cell is read as text and trimmed. Missing cells are empty strings.
Rows with an empty region or municipality are kept: they appear as their
own group in the summaries.

## Has a date?

A school has a date when its date cell, trimmed and upper-cased, is not
empty and is not one of the "no data" tokens: `#N/D`, `NAN`, `NONE`.
The content is not parsed as a date. More tokens can be added with the
`extraSentinels` option.

## Summaries

* by region: number of schools, with a date, without a date, and the
  percentage with a date. Best covered region first.
* by region and municipality: same counts, plus the total of the region.
  Sorted by percentage, then by municipality name.
* schools: every school with `WITH DATE` / `WITHOUT DATE`, sorted by region,
  municipality and school name.

Percentages are not rounded.

## Configuration file

The command line tool accepts a JSON configuration file:

```json
{
  "inputFile": "avaliacao.xlsx",
  "worksheetName": "Consolidação",
  "columns": {
    "region": "A",
    "municipality": "B",
    "schoolCode": "D",
    "schoolName": "E",
    "dateField": "F"
  },
  "extraSentinels": ["SEM DATA"],
  "outputDirectory": "reports",
  "region": "1ª REGIÃO DE ENSINO"
}
```

All the keys are optional. Columns can be Excel letters or 1-based numbers.
Relative paths are resolved from the directory of the configuration file.
`snapshotFile` saves the normalized records as a CSV file
(`region,municipality,school_code,school_name,date_field,has_date`), which
can be given back as the input of a later run. The `has_date` column of a
snapshot is informative: the flag is always derived again from the date.

## Reports

With an output directory, `covreport` writes `region_summary.csv`,
`municipality_summary.csv`, `schools.csv` and `summary.json`. With a region,
the summaries only list that region, but the region totals are still those
of the whole sheet.
*/
