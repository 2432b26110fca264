/*!

This is the long-form manual for `survey_flow` and `suture_survey`.

## Pages

A session goes through the following pages. There is no way back.

* **Intro**: the presentation of the study and the expert question. The
  question must be answered before continuing.
* **Ranking**: each of the N items (12 by default) gets a rank from 1 (the
  simplest) to N (the most complex). Each rank must be used exactly once.
  While some items have no rank, the page reports them as incomplete. When
  all the items are ranked but a rank is used twice, the page reports the
  duplicated ranks.
* **Ratings**: each parameter gets an importance rating on the scale of the
  survey (1 to 10 by default).
* **Done**: the response is stored, once. Showing this page again does not
  store anything.

## Stored responses

Each completed session adds one row to the response sheet:

```text
subject, expert, rank_1, ..., rank_N, rating_1, ..., rating_M
```

* `subject` is the number of rows already in the sheet (header excluded),
  plus one. It is not allocated by the sheet: two sessions finishing at the
  same time may get the same number. The `--audit` option of `suture_survey`
  detects it.
* `expert` is the label configured for the answer (for example `Yes` / `No`).
* unset numeric cells are written as empty cells, never as `0`.

If the sheet cannot be written, the response is not retried. The program
reports the failure on the terminal page and exits with status 2.

## Sheet providers

* `csv`: a comma-separated file with a header row. It can be imported as is
  into a shared spreadsheet.
* `jsonl`: one JSON object per line.

The `--audit` option also reads `.xlsx` files, for example the download of a
shared spreadsheet. It prints a JSON report (rows, valid rows, problems per
line, next subject id) and exits with status 3 when some rows have problems.

## Configuration

The survey is described in a JSON file, given with `--config`. Without it,
the built-in suture survey is used. See `demos/suture_survey.json` for a
complete example:

```json
{
  "surveyName": "Suture complexity",
  "intro": {
    "heading": "How do surgeons learn?",
    "title": "Suture complexity classification",
    "description": "...",
    "expertQuestion": "Are you an expert robotic surgeon?"
  },
  "ranking": {
    "title": "Suture complexity classification",
    "items": [{ "label": "Suture 1", "image": "sutura_1.jpg" }]
  },
  "ratings": {
    "title": "Suture parameters",
    "description": "...",
    "scaleMin": 1,
    "scaleMax": 10,
    "parameters": [{ "title": "Execution time" }]
  },
  "closing": { "title": "Thank you!" },
  "responseSheet": { "provider": "csv", "filePath": "responses.csv" }
}
```

The number of items and parameters in the file sets the shape of the
survey. A relative `filePath` is resolved from the directory of the
configuration file.

*/
